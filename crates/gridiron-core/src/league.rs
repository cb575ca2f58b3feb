// Leagues, contestants, and the join lifecycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::draft::roster::Roster;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeagueError {
    #[error("league name is required")]
    NameRequired,

    #[error("league size must be a positive number, got {size}")]
    InvalidSize { size: u32 },

    #[error("team name is required")]
    TeamNameRequired,

    #[error("league {league_id} is full")]
    LeagueFull { league_id: String },

    #[error("user {user_id} already has a team in league {league_id}")]
    AlreadyJoined { user_id: String, league_id: String },

    #[error("contestant belongs to league {actual}, not {expected}")]
    LeagueMismatch { expected: String, actual: String },

    #[error("league {league_id} is not full yet")]
    LeagueNotFull { league_id: String },

    #[error("league {league_id} has already been drafted")]
    AlreadyDrafted { league_id: String },

    #[error("league expects {expected} contestants, found {actual}")]
    ContestantCountMismatch { expected: u32, actual: usize },

    #[error("rounds must be between 1 and {max}, got {rounds}")]
    InvalidRounds { rounds: u32, max: u32 },
}

/// A league of `size` contestants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    #[serde(alias = "leagueName")]
    pub name: String,
    pub size: u32,
    /// Set once the last contestant joins. Never cleared.
    #[serde(default)]
    pub full: bool,
    /// Set once the league's draft makes its last pick. Never cleared.
    #[serde(default)]
    pub drafted: bool,
}

impl League {
    /// Create an empty league. The name is trimmed.
    pub fn new(id: impl Into<String>, name: &str, size: u32) -> Result<Self, LeagueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::NameRequired);
        }
        if size == 0 {
            return Err(LeagueError::InvalidSize { size });
        }
        Ok(League {
            id: id.into(),
            name: name.to_string(),
            size,
            full: false,
            drafted: false,
        })
    }
}

/// A user's team entry within one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    pub id: String,
    pub league_id: String,
    pub user_id: String,
    pub team_name: String,
    #[serde(default)]
    pub roster: Roster,
    #[serde(default)]
    pub wc_pts: f64,
    #[serde(default)]
    pub dv_pts: f64,
    #[serde(default)]
    pub cc_pts: f64,
    #[serde(default)]
    pub sb_pts: f64,
}

impl Contestant {
    pub fn new(
        id: impl Into<String>,
        league_id: impl Into<String>,
        user_id: impl Into<String>,
        team_name: impl Into<String>,
    ) -> Self {
        Contestant {
            id: id.into(),
            league_id: league_id.into(),
            user_id: user_id.into(),
            team_name: team_name.into(),
            roster: Roster::new(),
            wc_pts: 0.0,
            dv_pts: 0.0,
            cc_pts: 0.0,
            sb_pts: 0.0,
        }
    }

    /// Sum of the four playoff-round scores.
    pub fn total(&self) -> f64 {
        self.wc_pts + self.dv_pts + self.cc_pts + self.sb_pts
    }
}

/// Result of admitting a contestant into a league.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub contestant: Contestant,
    /// True when this contestant was the last one the league needed.
    pub league_full_now: bool,
}

/// Validate a new contestant against a league and its current members.
///
/// `existing` may contain contestants of other leagues; only members of
/// `league` are counted. The returned contestant has its team name trimmed.
pub fn join_league(
    league: &League,
    existing: &[Contestant],
    candidate: Contestant,
) -> Result<JoinOutcome, LeagueError> {
    if candidate.league_id != league.id {
        return Err(LeagueError::LeagueMismatch {
            expected: league.id.clone(),
            actual: candidate.league_id,
        });
    }

    let members: Vec<&Contestant> = existing
        .iter()
        .filter(|c| c.league_id == league.id)
        .collect();

    if league.full || members.len() >= league.size as usize {
        return Err(LeagueError::LeagueFull {
            league_id: league.id.clone(),
        });
    }

    let team_name = candidate.team_name.trim();
    if team_name.is_empty() {
        return Err(LeagueError::TeamNameRequired);
    }

    if members.iter().any(|c| c.user_id == candidate.user_id) {
        return Err(LeagueError::AlreadyJoined {
            user_id: candidate.user_id,
            league_id: league.id.clone(),
        });
    }

    let contestant = Contestant {
        team_name: team_name.to_string(),
        ..candidate
    };
    let league_full_now = members.len() + 1 == league.size as usize;
    if league_full_now {
        info!("League '{}' is now full ({} teams)", league.name, league.size);
    }

    Ok(JoinOutcome {
        contestant,
        league_full_now,
    })
}
