// League standings and playoff-round scoring.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::roster::RosterPlayer;
use crate::league::Contestant;

/// The four playoff rounds points are scored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringRound {
    WildCard,
    Divisional,
    Conference,
    SuperBowl,
}

impl ScoringRound {
    pub const ALL: [ScoringRound; 4] = [
        ScoringRound::WildCard,
        ScoringRound::Divisional,
        ScoringRound::Conference,
        ScoringRound::SuperBowl,
    ];

    /// Parse the short round code used in the score columns ("wc", "dv",
    /// "cc", "sb"). Case-insensitive.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "wc" => Some(ScoringRound::WildCard),
            "dv" => Some(ScoringRound::Divisional),
            "cc" => Some(ScoringRound::Conference),
            "sb" => Some(ScoringRound::SuperBowl),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ScoringRound::WildCard => "wc",
            ScoringRound::Divisional => "dv",
            ScoringRound::Conference => "cc",
            ScoringRound::SuperBowl => "sb",
        }
    }

    fn player_points(&self, p: &RosterPlayer) -> f64 {
        match self {
            ScoringRound::WildCard => p.wc_pts,
            ScoringRound::Divisional => p.dv_pts,
            ScoringRound::Conference => p.cc_pts,
            ScoringRound::SuperBowl => p.sb_pts,
        }
    }

    fn player_points_mut<'a>(&self, p: &'a mut RosterPlayer) -> &'a mut f64 {
        match self {
            ScoringRound::WildCard => &mut p.wc_pts,
            ScoringRound::Divisional => &mut p.dv_pts,
            ScoringRound::Conference => &mut p.cc_pts,
            ScoringRound::SuperBowl => &mut p.sb_pts,
        }
    }

    fn contestant_points_mut<'a>(&self, c: &'a mut Contestant) -> &'a mut f64 {
        match self {
            ScoringRound::WildCard => &mut c.wc_pts,
            ScoringRound::Divisional => &mut c.dv_pts,
            ScoringRound::Conference => &mut c.cc_pts,
            ScoringRound::SuperBowl => &mut c.sb_pts,
        }
    }
}

impl fmt::Display for ScoringRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("player {player_id} is not on this roster")]
    PlayerNotRostered { player_id: String },

    #[error("points must be a finite number, got {0}")]
    InvalidPoints(f64),
}

impl Contestant {
    /// Set a rostered player's points for one round and re-tally the
    /// contestant's score for that round from the whole roster.
    pub fn record_player_points(
        &mut self,
        player_id: &str,
        round: ScoringRound,
        points: f64,
    ) -> Result<(), ScoringError> {
        if !points.is_finite() {
            return Err(ScoringError::InvalidPoints(points));
        }
        let player = self
            .roster
            .player_mut(player_id)
            .ok_or_else(|| ScoringError::PlayerNotRostered {
                player_id: player_id.to_string(),
            })?;
        *round.player_points_mut(player) = points;

        let tally: f64 = self.roster.players().map(|p| round.player_points(p)).sum();
        *round.contestant_points_mut(self) = tally;
        Ok(())
    }
}

fn compare_standing(a: &Contestant, b: &Contestant) -> Ordering {
    b.total()
        .total_cmp(&a.total())
        .then_with(|| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()))
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order contestants by total points, highest first. Ties go to the team
/// name, compared case-insensitively. The result does not depend on the
/// input order.
pub fn standings(contestants: &[Contestant]) -> Vec<Contestant> {
    let mut ranked = contestants.to_vec();
    ranked.sort_by(compare_standing);
    ranked
}
