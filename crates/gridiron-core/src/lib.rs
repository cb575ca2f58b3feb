// Snake-draft engine: turn order, roster slots, league lifecycle, standings.
//
// Everything here is pure computation over plain records. Persistence and
// the transactional boundary live in gridiron-app.

pub mod draft;
pub mod league;
pub mod standings;

pub use draft::order::{new_draft_order, new_draft_order_random};
pub use draft::pick::{DraftResult, Player, Position};
pub use draft::roster::{Roster, RosterPlayer, SlotName};
pub use draft::state::{available_players, confirm_pick, Direction, Draft, PickOutcome, DEFAULT_ROUNDS};
pub use draft::DraftError;
pub use league::{join_league, Contestant, JoinOutcome, League, LeagueError};
pub use standings::{standings, ScoringError, ScoringRound};
