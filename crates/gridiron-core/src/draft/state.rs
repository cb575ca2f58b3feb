// Draft state: snake order, turn resolution, and the pick transition.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::order::new_draft_order;
use super::pick::{DraftResult, Player};
use super::roster::{RosterPlayer, SlotName};
use super::DraftError;
use crate::league::{Contestant, League, LeagueError};

/// Number of rounds a standard draft runs: one per roster slot.
pub const DEFAULT_ROUNDS: u32 = 14;

/// Sweep direction within the current round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// The complete state of one league's draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub league_id: String,
    /// Contestant ids in first-round order. Fixed at creation.
    pub order: Vec<String>,
    pub size: u32,
    pub rounds: u32,
    #[serde(default)]
    pub direction: Direction,
    pub current_round: u32,
    pub current_pick_in_round: u32,
    /// Picks made so far. The pick on the clock is `overall_pick + 1`.
    #[serde(default)]
    pub overall_pick: u32,
    #[serde(default)]
    pub results: Vec<DraftResult>,
    #[serde(default)]
    pub completed: bool,
}

/// Everything a successful pick produces. Nothing is persisted by the
/// engine; the caller commits `contestant` and `draft` together.
#[derive(Debug, Clone, PartialEq)]
pub struct PickOutcome {
    pub contestant: Contestant,
    pub draft: Draft,
    pub slot: SlotName,
    pub result: DraftResult,
    /// True when this pick completed the draft and the league should be
    /// marked drafted.
    pub league_drafted_now: bool,
}

impl Draft {
    /// Start a draft with an explicit first-round order.
    pub fn new(
        id: impl Into<String>,
        league_id: impl Into<String>,
        order: Vec<String>,
        rounds: u32,
    ) -> Self {
        Draft {
            id: id.into(),
            league_id: league_id.into(),
            size: order.len() as u32,
            order,
            rounds,
            direction: Direction::Forward,
            current_round: 1,
            current_pick_in_round: 1,
            overall_pick: 0,
            results: Vec::new(),
            completed: false,
        }
    }

    /// Create the draft for a league that just filled, shuffling its
    /// contestants into a random order.
    pub fn create<R: Rng + ?Sized>(
        id: impl Into<String>,
        league: &League,
        contestants: &[Contestant],
        rounds: u32,
        rng: &mut R,
    ) -> Result<Self, LeagueError> {
        if !league.full {
            return Err(LeagueError::LeagueNotFull {
                league_id: league.id.clone(),
            });
        }
        if league.drafted {
            return Err(LeagueError::AlreadyDrafted {
                league_id: league.id.clone(),
            });
        }
        let max = SlotName::ALL.len() as u32;
        if rounds == 0 || rounds > max {
            return Err(LeagueError::InvalidRounds { rounds, max });
        }

        let ids: Vec<String> = contestants
            .iter()
            .filter(|c| c.league_id == league.id)
            .map(|c| c.id.clone())
            .collect();
        if ids.len() != league.size as usize {
            return Err(LeagueError::ContestantCountMismatch {
                expected: league.size,
                actual: ids.len(),
            });
        }

        let order = new_draft_order(&ids, rng);
        let draft = Draft::new(id, league.id.clone(), order, rounds);
        info!(
            "Draft {} created for league '{}': {} teams, {} rounds",
            draft.id, league.name, draft.size, draft.rounds
        );
        Ok(draft)
    }

    /// The contestant on the clock, or `None` when the order is empty or the
    /// pick counter is out of range.
    ///
    /// Forward rounds index `order[pick - 1]`; backward rounds index
    /// `order[len - pick]`, so the last picker of one round opens the next.
    pub fn active_contestant_id(&self) -> Option<&str> {
        let pick = self.current_pick_in_round as usize;
        let idx = match self.direction {
            Direction::Forward => pick.checked_sub(1)?,
            Direction::Backward => self.order.len().checked_sub(pick)?,
        };
        self.order.get(idx).map(String::as_str)
    }

    /// Total picks the draft will make. Saturates for records that were
    /// never validated by [`Draft::create`].
    pub fn total_picks(&self) -> u32 {
        self.rounds.saturating_mul(self.size)
    }

    /// 1-based number of the pick currently on the clock.
    pub fn current_pick_number(&self) -> u32 {
        self.overall_pick + 1
    }

    /// Whether a player has already been taken by anyone.
    pub fn is_drafted(&self, player_id: &str) -> bool {
        self.results.iter().any(|r| r.player_id == player_id)
    }

    /// The result recorded when the draft stood at `overall_pick`, if it was
    /// for `player_id`. Used to recognise a retried confirmation.
    pub fn recorded_pick(&self, overall_pick: u32, player_id: &str) -> Option<&DraftResult> {
        self.results
            .get(overall_pick as usize)
            .filter(|r| r.player_id == player_id)
    }

    /// Move the clock forward one pick. Returns true if this completed the
    /// draft.
    fn advance(&mut self) -> bool {
        self.overall_pick += 1;
        if self.current_pick_in_round >= self.size {
            self.current_round += 1;
            self.current_pick_in_round = 1;
            self.direction = self.direction.flipped();
        } else {
            self.current_pick_in_round += 1;
        }

        if !self.completed && self.overall_pick >= self.total_picks() {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Validate and apply one pick.
///
/// Checks, in order: the draft is still running, `contestant` is on the
/// clock, the player has an id and a draftable position, nobody has drafted
/// the player, the contestant has no one from the same NFL team, and an
/// eligible slot is open. On success returns updated copies of both records;
/// on failure the inputs are untouched.
pub fn confirm_pick(
    draft: &Draft,
    contestant: &Contestant,
    player: &Player,
) -> Result<PickOutcome, DraftError> {
    if draft.completed {
        return Err(DraftError::DraftCompleted);
    }
    if draft.active_contestant_id() != Some(contestant.id.as_str()) {
        return Err(DraftError::NotYourTurn {
            contestant_id: contestant.id.clone(),
        });
    }
    if player.player_id.trim().is_empty() {
        return Err(DraftError::MissingPlayerId);
    }
    let position = player
        .parsed_position()
        .ok_or_else(|| DraftError::UnknownPosition(player.position.clone()))?;
    if draft.is_drafted(&player.player_id) || contestant.roster.has_player(&player.player_id) {
        return Err(DraftError::DuplicatePick {
            player_id: player.player_id.clone(),
        });
    }
    if contestant.roster.has_team(&player.team_id) {
        return Err(DraftError::DuplicateTeam {
            team_id: player.team_id.clone(),
        });
    }
    let slot = contestant
        .roster
        .first_open_slot(position)
        .ok_or(DraftError::RosterFull { position })?;

    let mut contestant = contestant.clone();
    contestant
        .roster
        .place(slot, RosterPlayer::from_player(player, position))?;

    let mut draft = draft.clone();
    let result = DraftResult {
        pick_number: draft.current_pick_number(),
        picking_team: contestant.team_name.clone(),
        player_id: player.player_id.clone(),
        player_name: player.player_name.clone(),
        position: position.display_str().to_string(),
        team_id: player.team_id.clone(),
        team_name: player.team_name.clone(),
    };
    draft.results.push(result.clone());
    let league_drafted_now = draft.advance();

    debug!(
        "Pick {}: {} takes {} ({}) into {}",
        result.pick_number, result.picking_team, result.player_name, result.position, slot
    );
    if league_drafted_now {
        info!(
            "Draft {} completed after {} picks",
            draft.id, draft.overall_pick
        );
    }

    Ok(PickOutcome {
        contestant,
        draft,
        slot,
        result,
        league_drafted_now,
    })
}

/// Catalog players the contestant could legally take right now: not drafted,
/// not from an NFL team already on the roster, and with an open slot.
pub fn available_players<'a>(
    catalog: &'a [Player],
    draft: &Draft,
    contestant: &Contestant,
) -> Vec<&'a Player> {
    catalog
        .iter()
        .filter(|p| !p.player_id.is_empty() && !draft.is_drafted(&p.player_id))
        .filter(|p| !contestant.roster.has_team(&p.team_id))
        .filter(|p| {
            p.parsed_position()
                .is_some_and(|pos| contestant.roster.first_open_slot(pos).is_some())
        })
        .collect()
}
