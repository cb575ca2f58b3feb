// Player catalog entries, positions, and recorded draft results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions that can be drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DST")]
    Defense,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace, so
    /// "qb", " Qb " and "QB" all parse to `Quarterback`.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DST" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DST",
        }
    }

    /// Whether players at this position may fill a flex slot.
    pub fn is_flex_eligible(&self) -> bool {
        matches!(
            self,
            Position::RunningBack | Position::WideReceiver | Position::TightEnd
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player from the externally supplied catalog.
///
/// The REST collaborator is inconsistent about id field naming, so `id` and
/// `_id` are accepted as aliases for `playerId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(alias = "id", alias = "_id", default)]
    pub player_id: String,
    #[serde(alias = "name", default)]
    pub player_name: String,
    /// Position string as supplied by the catalog (e.g. "QB", "dst").
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub team_name: String,
}

impl Player {
    /// Parsed position, if the catalog string is one we draft.
    pub fn parsed_position(&self) -> Option<Position> {
        Position::from_str_pos(&self.position)
    }
}

/// A single recorded pick. Appended to `Draft::results` and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResult {
    /// Sequential pick number (1-indexed).
    pub pick_number: u32,
    /// Team name of the contestant that made the pick, at pick time.
    pub picking_team: String,
    pub player_id: String,
    pub player_name: String,
    pub position: String,
    /// NFL team the drafted player belongs to.
    pub team_id: String,
    pub team_name: String,
}
