// League and draft service: loads state, runs the engine, and commits the
// result in one transaction.
//
// Every mutation is validated against freshly loaded state and then written
// with an optimistic guard on the state it was validated against. Losing a
// race means nothing is written and the caller gets `StalePick` (picks) or
// `Conflict` (joins).

use std::sync::{Mutex, PoisonError};

use gridiron_core::{
    self as engine, Contestant, Draft, DraftError, DraftResult, League, LeagueError, Player,
    ScoringError, ScoringRound, SlotName,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DraftConfig;
use crate::db::Database;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    League(#[from] LeagueError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("{what} `{id}` not found")]
    NotFound { what: &'static str, id: String },

    #[error("league {league_id} has no draft yet")]
    DraftNotStarted { league_id: String },

    #[error("draft has moved on: pick confirmed at {expected} picks made, draft is at {actual}")]
    StalePick { expected: u32, actual: u32 },

    #[error("league {league_id} changed while joining; try again")]
    Conflict { league_id: String },

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What a successful join produced.
#[derive(Debug, Clone)]
pub struct JoinReceipt {
    pub contestant: Contestant,
    /// The draft created because this join filled the league.
    pub draft: Option<Draft>,
}

/// What a confirmed pick produced.
#[derive(Debug, Clone)]
pub struct PickReceipt {
    pub result: DraftResult,
    pub slot: SlotName,
    /// True when this confirmation repeated one already committed and
    /// nothing new was written.
    pub replayed: bool,
    pub draft_completed: bool,
}

/// A league with its members and draft, loaded together.
#[derive(Debug, Clone)]
pub struct LeagueStatus {
    pub league: League,
    pub contestants: Vec<Contestant>,
    pub draft: Option<Draft>,
}

impl LeagueStatus {
    /// The contestant currently on the clock, if a draft is running.
    pub fn on_the_clock(&self) -> Option<&Contestant> {
        let draft = self.draft.as_ref().filter(|d| !d.completed)?;
        let id = draft.active_contestant_id()?;
        self.contestants.iter().find(|c| c.id == id)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct DraftService {
    db: Database,
    rounds: u32,
    rng: Mutex<StdRng>,
}

impl DraftService {
    pub fn new(db: Database, config: &DraftConfig) -> Self {
        let rng = match config.order_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        DraftService {
            db,
            rounds: config.rounds,
            rng: Mutex::new(rng),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Import catalog players. Returns the number written.
    pub fn import_catalog(&self, players: &[Player]) -> ServiceResult<usize> {
        let n = self.db.import_players(players)?;
        info!("Imported {} catalog players", n);
        Ok(n)
    }

    pub fn create_league(&self, name: &str, size: u32) -> ServiceResult<League> {
        let league = League::new(Database::generate_id("league"), name, size)?;
        self.db.insert_league(&league)?;
        info!(
            "League '{}' created ({}, {} teams)",
            league.name, league.id, league.size
        );
        Ok(league)
    }

    /// Add the user's team to a league. The join that fills the league also
    /// creates its draft with a shuffled order, in the same transaction.
    pub fn join_league(
        &self,
        league_id: &str,
        user_id: &str,
        team_name: &str,
    ) -> ServiceResult<JoinReceipt> {
        let league = self.require_league(league_id)?;
        let members = self.db.load_contestants(league_id)?;

        let candidate = Contestant::new(
            Database::generate_id("team"),
            league_id,
            user_id,
            team_name,
        );
        let outcome = engine::join_league(&league, &members, candidate)?;

        let draft = if outcome.league_full_now {
            let full = League {
                full: true,
                ..league.clone()
            };
            let mut everyone = members.clone();
            everyone.push(outcome.contestant.clone());
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            Some(Draft::create(
                Database::generate_id("draft"),
                &full,
                &everyone,
                self.rounds,
                &mut *rng,
            )?)
        } else {
            None
        };

        if !self
            .db
            .commit_join(&outcome.contestant, members.len(), draft.as_ref())?
        {
            if self.db.load_contestant_for_user(league_id, user_id)?.is_some() {
                warn!("User {} joined league {} concurrently, rejecting", user_id, league_id);
                return Err(LeagueError::AlreadyJoined {
                    user_id: user_id.to_string(),
                    league_id: league_id.to_string(),
                }
                .into());
            }
            warn!("Join to league {} lost a race, rejecting", league_id);
            return Err(ServiceError::Conflict {
                league_id: league_id.to_string(),
            });
        }

        info!(
            "User {} joined league {} as '{}'",
            user_id, league_id, outcome.contestant.team_name
        );
        Ok(JoinReceipt {
            contestant: outcome.contestant,
            draft,
        })
    }

    /// Leagues that still have room, with how many teams have joined.
    pub fn open_leagues(&self) -> ServiceResult<Vec<(League, usize)>> {
        Ok(self.db.open_leagues()?)
    }

    /// The league's draft with every result in pick order.
    pub fn draft_board(&self, league_id: &str) -> ServiceResult<Draft> {
        self.require_league(league_id)?;
        self.require_draft(league_id)
    }

    pub fn league_status(&self, league_id: &str) -> ServiceResult<LeagueStatus> {
        let league = self.require_league(league_id)?;
        let contestants = self.db.load_contestants(league_id)?;
        let draft = self.db.load_draft(league_id)?;
        Ok(LeagueStatus {
            league,
            contestants,
            draft,
        })
    }

    pub fn contestant(&self, league_id: &str, user_id: &str) -> ServiceResult<Contestant> {
        self.require_league(league_id)?;
        self.db
            .load_contestant_for_user(league_id, user_id)?
            .ok_or_else(|| ServiceError::NotFound {
                what: "team for user",
                id: user_id.to_string(),
            })
    }

    /// Confirm a pick for the user's team.
    ///
    /// `expected_overall_pick` is the number of picks the client saw made
    /// when it offered the choice; `None` means "whatever is current". A
    /// confirmation for a pick that has already been committed for the same
    /// team and player is answered from the stored result without writing.
    pub fn confirm_pick(
        &self,
        league_id: &str,
        user_id: &str,
        player_id: &str,
        expected_overall_pick: Option<u32>,
    ) -> ServiceResult<PickReceipt> {
        let contestant = self.contestant(league_id, user_id)?;
        let draft = self.require_draft(league_id)?;
        let expected = expected_overall_pick.unwrap_or(draft.overall_pick);

        if expected != draft.overall_pick {
            if let Some(receipt) = self.replayed_pick(&draft, &contestant, expected, player_id)? {
                info!(
                    "Replayed pick {} for '{}' in league {}",
                    receipt.result.pick_number, contestant.team_name, league_id
                );
                return Ok(receipt);
            }
            warn!(
                "Stale pick from '{}' in league {}: expected {}, at {}",
                contestant.team_name, league_id, expected, draft.overall_pick
            );
            return Err(ServiceError::StalePick {
                expected,
                actual: draft.overall_pick,
            });
        }

        let player = self
            .db
            .load_player(player_id)?
            .ok_or_else(|| ServiceError::NotFound {
                what: "player",
                id: player_id.to_string(),
            })?;

        let outcome = engine::confirm_pick(&draft, &contestant, &player)?;

        if !self.db.commit_pick(&outcome, expected)? {
            let actual = self
                .db
                .load_draft(league_id)?
                .map_or(expected, |d| d.overall_pick);
            warn!(
                "Pick commit for '{}' in league {} lost a race at {}",
                contestant.team_name, league_id, expected
            );
            return Err(ServiceError::StalePick { expected, actual });
        }

        info!(
            "League {} pick {}: '{}' took {} ({}) into {}",
            league_id,
            outcome.result.pick_number,
            outcome.result.picking_team,
            outcome.result.player_name,
            outcome.result.position,
            outcome.slot
        );
        if outcome.league_drafted_now {
            info!("League {} is drafted", league_id);
        }

        Ok(PickReceipt {
            result: outcome.result,
            slot: outcome.slot,
            replayed: false,
            draft_completed: outcome.draft.completed,
        })
    }

    /// The stored receipt if pick `expected` (0-based) was already made by
    /// this contestant for this player.
    fn replayed_pick(
        &self,
        draft: &Draft,
        contestant: &Contestant,
        expected: u32,
        player_id: &str,
    ) -> ServiceResult<Option<PickReceipt>> {
        let Some(result) = draft.recorded_pick(expected, player_id) else {
            return Ok(None);
        };
        let owner = self.db.pick_contestant(&draft.id, result.pick_number)?;
        if owner.as_deref() != Some(contestant.id.as_str()) {
            return Ok(None);
        }
        let slot = contestant
            .roster
            .iter()
            .find_map(|(slot, p)| p.filter(|p| p.player_id == player_id).map(|_| slot));
        Ok(slot.map(|slot| PickReceipt {
            result: result.clone(),
            slot,
            replayed: true,
            draft_completed: draft.completed,
        }))
    }

    /// Players the user's team could legally take right now, in catalog
    /// order.
    pub fn available_players(&self, league_id: &str, user_id: &str) -> ServiceResult<Vec<Player>> {
        let contestant = self.contestant(league_id, user_id)?;
        let draft = self.require_draft(league_id)?;
        let catalog = self.db.load_players()?;
        let available: Vec<Player> = engine::available_players(&catalog, &draft, &contestant)
            .into_iter()
            .cloned()
            .collect();
        debug!(
            "{} of {} players available to '{}'",
            available.len(),
            catalog.len(),
            contestant.team_name
        );
        Ok(available)
    }

    pub fn standings(&self, league_id: &str) -> ServiceResult<Vec<Contestant>> {
        self.require_league(league_id)?;
        let contestants = self.db.load_contestants(league_id)?;
        Ok(engine::standings(&contestants))
    }

    /// Record a rostered player's points for one playoff round.
    pub fn record_points(
        &self,
        league_id: &str,
        user_id: &str,
        player_id: &str,
        round: ScoringRound,
        points: f64,
    ) -> ServiceResult<Contestant> {
        let loaded = self.contestant(league_id, user_id)?;
        // Validate on a copy for a typed error; the store re-applies the
        // change to the current row.
        loaded.clone().record_player_points(player_id, round, points)?;
        let contestant = self
            .db
            .record_player_points(&loaded.id, player_id, round, points)?;
        info!(
            "'{}' {} points for {}: {} (total {})",
            contestant.team_name,
            round,
            player_id,
            points,
            contestant.total()
        );
        Ok(contestant)
    }

    // -- lookups --

    fn require_league(&self, league_id: &str) -> ServiceResult<League> {
        self.db
            .load_league(league_id)?
            .ok_or_else(|| ServiceError::NotFound {
                what: "league",
                id: league_id.to_string(),
            })
    }

    fn require_draft(&self, league_id: &str) -> ServiceResult<Draft> {
        self.db
            .load_draft(league_id)?
            .ok_or_else(|| ServiceError::DraftNotStarted {
                league_id: league_id.to_string(),
            })
    }
}
