// Draft order randomization.

use rand::seq::SliceRandom;
use rand::Rng;

/// Uniformly shuffle the contestant ids of a just-filled league into a
/// draft order. The order is fixed for the lifetime of the draft.
pub fn new_draft_order<R: Rng + ?Sized>(contestant_ids: &[String], rng: &mut R) -> Vec<String> {
    let mut order = contestant_ids.to_vec();
    order.shuffle(rng);
    order
}

/// Shuffle using the thread-local RNG.
pub fn new_draft_order_random(contestant_ids: &[String]) -> Vec<String> {
    new_draft_order(contestant_ids, &mut rand::rng())
}
