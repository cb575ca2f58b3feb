pub mod order;
pub mod pick;
pub mod roster;
pub mod state;

use thiserror::Error;

use pick::Position;
use roster::SlotName;

/// Reasons a pick is rejected. Every variant leaves draft and roster
/// untouched; the caller re-offers the choice to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("player {player_id} has already been drafted")]
    DuplicatePick { player_id: String },

    #[error("roster already has a player from team {team_id}")]
    DuplicateTeam { team_id: String },

    #[error("no open roster slot for position {position}")]
    RosterFull { position: Position },

    #[error("it is not contestant {contestant_id}'s turn")]
    NotYourTurn { contestant_id: String },

    #[error("the draft is already completed")]
    DraftCompleted,

    #[error("player has no id")]
    MissingPlayerId,

    #[error("unknown position `{0}`")]
    UnknownPosition(String),

    #[error("roster slot {slot} is already filled")]
    SlotOccupied { slot: SlotName },
}
