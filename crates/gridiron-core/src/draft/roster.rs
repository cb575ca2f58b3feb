// Roster construction and slot assignment.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::pick::{Player, Position};
use super::DraftError;

/// The fourteen named roster slots every contestant owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    Qb1,
    Qb2,
    Rb1,
    Rb2,
    Wr1,
    Wr2,
    Wr3,
    Te1,
    Fl1,
    Fl2,
    Fl3,
    Fl4,
    Kicker,
    Dst,
}

const QB_PRIORITY: &[SlotName] = &[SlotName::Qb1, SlotName::Qb2];
const RB_PRIORITY: &[SlotName] = &[
    SlotName::Rb1,
    SlotName::Rb2,
    SlotName::Fl1,
    SlotName::Fl2,
    SlotName::Fl3,
    SlotName::Fl4,
];
const WR_PRIORITY: &[SlotName] = &[
    SlotName::Wr1,
    SlotName::Wr2,
    SlotName::Wr3,
    SlotName::Fl1,
    SlotName::Fl2,
    SlotName::Fl3,
    SlotName::Fl4,
];
const TE_PRIORITY: &[SlotName] = &[
    SlotName::Te1,
    SlotName::Fl1,
    SlotName::Fl2,
    SlotName::Fl3,
    SlotName::Fl4,
];
const K_PRIORITY: &[SlotName] = &[SlotName::Kicker];
const DST_PRIORITY: &[SlotName] = &[SlotName::Dst];

impl SlotName {
    /// All slots in display order.
    pub const ALL: [SlotName; 14] = [
        SlotName::Qb1,
        SlotName::Qb2,
        SlotName::Rb1,
        SlotName::Rb2,
        SlotName::Wr1,
        SlotName::Wr2,
        SlotName::Wr3,
        SlotName::Te1,
        SlotName::Fl1,
        SlotName::Fl2,
        SlotName::Fl3,
        SlotName::Fl4,
        SlotName::Kicker,
        SlotName::Dst,
    ];

    /// Ordered slot preference for a position. Dedicated slots come first,
    /// then the shared flex slots for RB/WR/TE.
    pub fn priority_for(pos: Position) -> &'static [SlotName] {
        match pos {
            Position::Quarterback => QB_PRIORITY,
            Position::RunningBack => RB_PRIORITY,
            Position::WideReceiver => WR_PRIORITY,
            Position::TightEnd => TE_PRIORITY,
            Position::Kicker => K_PRIORITY,
            Position::Defense => DST_PRIORITY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Qb1 => "qb1",
            SlotName::Qb2 => "qb2",
            SlotName::Rb1 => "rb1",
            SlotName::Rb2 => "rb2",
            SlotName::Wr1 => "wr1",
            SlotName::Wr2 => "wr2",
            SlotName::Wr3 => "wr3",
            SlotName::Te1 => "te1",
            SlotName::Fl1 => "fl1",
            SlotName::Fl2 => "fl2",
            SlotName::Fl3 => "fl3",
            SlotName::Fl4 => "fl4",
            SlotName::Kicker => "kicker",
            SlotName::Dst => "dst",
        }
    }

    /// Short position label shown next to the slot in a roster table.
    pub fn label(&self) -> &'static str {
        match self {
            SlotName::Qb1 | SlotName::Qb2 => "QB",
            SlotName::Rb1 | SlotName::Rb2 => "RB",
            SlotName::Wr1 | SlotName::Wr2 | SlotName::Wr3 => "WR",
            SlotName::Te1 => "TE",
            SlotName::Fl1 | SlotName::Fl2 | SlotName::Fl3 | SlotName::Fl4 => "FL",
            SlotName::Kicker => "K",
            SlotName::Dst => "DST",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player assigned to a roster slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub team_name: String,
    pub position: Position,
    #[serde(default)]
    pub wc_pts: f64,
    #[serde(default)]
    pub dv_pts: f64,
    #[serde(default)]
    pub cc_pts: f64,
    #[serde(default)]
    pub sb_pts: f64,
}

impl RosterPlayer {
    /// Build a roster entry for a catalog player already known to play `position`.
    pub fn from_player(player: &Player, position: Position) -> Self {
        RosterPlayer {
            player_id: player.player_id.clone(),
            player_name: player.player_name.clone(),
            team_id: player.team_id.clone(),
            team_name: player.team_name.clone(),
            position,
            wc_pts: 0.0,
            dv_pts: 0.0,
            cc_pts: 0.0,
            sb_pts: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.wc_pts + self.dv_pts + self.cc_pts + self.sb_pts
    }
}

/// A contestant's fixed-shape roster. Slots only ever go from empty to
/// filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    pub qb1: Option<RosterPlayer>,
    pub qb2: Option<RosterPlayer>,
    pub rb1: Option<RosterPlayer>,
    pub rb2: Option<RosterPlayer>,
    pub wr1: Option<RosterPlayer>,
    pub wr2: Option<RosterPlayer>,
    pub wr3: Option<RosterPlayer>,
    pub te1: Option<RosterPlayer>,
    pub fl1: Option<RosterPlayer>,
    pub fl2: Option<RosterPlayer>,
    pub fl3: Option<RosterPlayer>,
    pub fl4: Option<RosterPlayer>,
    pub kicker: Option<RosterPlayer>,
    pub dst: Option<RosterPlayer>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, slot: SlotName) -> &Option<RosterPlayer> {
        match slot {
            SlotName::Qb1 => &self.qb1,
            SlotName::Qb2 => &self.qb2,
            SlotName::Rb1 => &self.rb1,
            SlotName::Rb2 => &self.rb2,
            SlotName::Wr1 => &self.wr1,
            SlotName::Wr2 => &self.wr2,
            SlotName::Wr3 => &self.wr3,
            SlotName::Te1 => &self.te1,
            SlotName::Fl1 => &self.fl1,
            SlotName::Fl2 => &self.fl2,
            SlotName::Fl3 => &self.fl3,
            SlotName::Fl4 => &self.fl4,
            SlotName::Kicker => &self.kicker,
            SlotName::Dst => &self.dst,
        }
    }

    fn entry_mut(&mut self, slot: SlotName) -> &mut Option<RosterPlayer> {
        match slot {
            SlotName::Qb1 => &mut self.qb1,
            SlotName::Qb2 => &mut self.qb2,
            SlotName::Rb1 => &mut self.rb1,
            SlotName::Rb2 => &mut self.rb2,
            SlotName::Wr1 => &mut self.wr1,
            SlotName::Wr2 => &mut self.wr2,
            SlotName::Wr3 => &mut self.wr3,
            SlotName::Te1 => &mut self.te1,
            SlotName::Fl1 => &mut self.fl1,
            SlotName::Fl2 => &mut self.fl2,
            SlotName::Fl3 => &mut self.fl3,
            SlotName::Fl4 => &mut self.fl4,
            SlotName::Kicker => &mut self.kicker,
            SlotName::Dst => &mut self.dst,
        }
    }

    /// The player in `slot`, if it is filled.
    pub fn slot(&self, slot: SlotName) -> Option<&RosterPlayer> {
        self.entry(slot).as_ref()
    }

    pub fn is_open(&self, slot: SlotName) -> bool {
        self.entry(slot).is_none()
    }

    /// Pick the first open slot for a position, following the fixed
    /// priority table.
    ///
    /// Fails with `UnknownPosition` for strings that are not a draftable
    /// position and with `RosterFull` when every eligible slot (flex
    /// included) is taken. Never mutates the roster.
    pub fn assign_slot(&self, position: &str) -> Result<SlotName, DraftError> {
        let pos = Position::from_str_pos(position)
            .ok_or_else(|| DraftError::UnknownPosition(position.to_string()))?;
        self.first_open_slot(pos)
            .ok_or(DraftError::RosterFull { position: pos })
    }

    /// First open slot for an already-parsed position.
    pub fn first_open_slot(&self, pos: Position) -> Option<SlotName> {
        SlotName::priority_for(pos)
            .iter()
            .copied()
            .find(|&slot| self.is_open(slot))
    }

    /// Write a player into an empty slot. Filled slots are never overwritten.
    pub fn place(&mut self, slot: SlotName, player: RosterPlayer) -> Result<(), DraftError> {
        let entry = self.entry_mut(slot);
        if entry.is_some() {
            return Err(DraftError::SlotOccupied { slot });
        }
        *entry = Some(player);
        Ok(())
    }

    /// Iterate all slots in display order with their occupant.
    pub fn iter(&self) -> impl Iterator<Item = (SlotName, Option<&RosterPlayer>)> + '_ {
        SlotName::ALL.into_iter().map(move |s| (s, self.slot(s)))
    }

    /// Iterate only the filled slots.
    pub fn players(&self) -> impl Iterator<Item = &RosterPlayer> + '_ {
        self.iter().filter_map(|(_, p)| p)
    }

    pub(crate) fn player_mut(&mut self, player_id: &str) -> Option<&mut RosterPlayer> {
        let slot = SlotName::ALL
            .into_iter()
            .find(|&s| self.slot(s).is_some_and(|p| p.player_id == player_id))?;
        self.entry_mut(slot).as_mut()
    }

    /// Whether a player is already on this roster.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players().any(|p| p.player_id == player_id)
    }

    /// Whether any rostered player belongs to the given NFL team. Empty team
    /// ids never match.
    pub fn has_team(&self, team_id: &str) -> bool {
        !team_id.is_empty() && self.players().any(|p| p.team_id == team_id)
    }

    /// Number of filled slots.
    pub fn filled_count(&self) -> usize {
        self.players().count()
    }

    /// Total number of slots.
    pub fn total_count(&self) -> usize {
        SlotName::ALL.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rostered(id: &str, team: &str, pos: Position) -> RosterPlayer {
        RosterPlayer {
            player_id: id.to_string(),
            player_name: format!("Player {id}"),
            team_id: team.to_string(),
            team_name: format!("Team {team}"),
            position: pos,
            wc_pts: 0.0,
            dv_pts: 0.0,
            cc_pts: 0.0,
            sb_pts: 0.0,
        }
    }

    fn fill(roster: &mut Roster, slots: &[SlotName], pos: Position) {
        for (i, &slot) in slots.iter().enumerate() {
            roster
                .place(slot, rostered(&format!("{slot}-{i}"), &format!("T{slot}"), pos))
                .unwrap();
        }
    }

    #[test]
    fn new_roster_all_slots_empty() {
        let roster = Roster::new();
        assert_eq!(roster.total_count(), 14);
        assert_eq!(roster.filled_count(), 0);
        assert!(SlotName::ALL.iter().all(|&s| roster.is_open(s)));
    }

    #[test]
    fn assign_dedicated_slot_first() {
        let roster = Roster::new();
        assert_eq!(roster.assign_slot("QB").unwrap(), SlotName::Qb1);
        assert_eq!(roster.assign_slot("RB").unwrap(), SlotName::Rb1);
        assert_eq!(roster.assign_slot("WR").unwrap(), SlotName::Wr1);
        assert_eq!(roster.assign_slot("TE").unwrap(), SlotName::Te1);
        assert_eq!(roster.assign_slot("K").unwrap(), SlotName::Kicker);
        assert_eq!(roster.assign_slot("DST").unwrap(), SlotName::Dst);
    }

    #[test]
    fn assign_slot_is_case_insensitive() {
        let roster = Roster::new();
        assert_eq!(roster.assign_slot("qb").unwrap(), SlotName::Qb1);
        assert_eq!(roster.assign_slot("Dst").unwrap(), SlotName::Dst);
    }

    #[test]
    fn rb_overflows_into_first_flex() {
        let mut roster = Roster::new();
        fill(&mut roster, &[SlotName::Rb1, SlotName::Rb2], Position::RunningBack);
        assert_eq!(roster.assign_slot("RB").unwrap(), SlotName::Fl1);
    }

    #[test]
    fn wr_walks_dedicated_then_flex() {
        let mut roster = Roster::new();
        fill(
            &mut roster,
            &[SlotName::Wr1, SlotName::Wr2, SlotName::Wr3, SlotName::Fl1],
            Position::WideReceiver,
        );
        assert_eq!(roster.assign_slot("WR").unwrap(), SlotName::Fl2);
    }

    #[test]
    fn te_skips_filled_flex_slots() {
        let mut roster = Roster::new();
        fill(&mut roster, &[SlotName::Te1], Position::TightEnd);
        fill(&mut roster, &[SlotName::Fl1, SlotName::Fl2], Position::RunningBack);
        assert_eq!(roster.assign_slot("TE").unwrap(), SlotName::Fl3);
    }

    #[test]
    fn flex_shared_between_positions() {
        let mut roster = Roster::new();
        fill(&mut roster, &[SlotName::Rb1, SlotName::Rb2], Position::RunningBack);
        fill(
            &mut roster,
            &[SlotName::Fl1, SlotName::Fl2, SlotName::Fl3, SlotName::Fl4],
            Position::WideReceiver,
        );
        // WR dedicated slots are still open
        assert_eq!(roster.assign_slot("WR").unwrap(), SlotName::Wr1);
        // but an RB has nowhere to go
        assert_eq!(
            roster.assign_slot("RB").unwrap_err(),
            DraftError::RosterFull {
                position: Position::RunningBack
            }
        );
    }

    #[test]
    fn qb_full_after_two() {
        let mut roster = Roster::new();
        fill(&mut roster, &[SlotName::Qb1, SlotName::Qb2], Position::Quarterback);
        // QBs never go to flex
        assert!(matches!(
            roster.assign_slot("QB"),
            Err(DraftError::RosterFull {
                position: Position::Quarterback
            })
        ));
    }

    #[test]
    fn kicker_and_dst_have_one_slot() {
        let mut roster = Roster::new();
        fill(&mut roster, &[SlotName::Kicker], Position::Kicker);
        fill(&mut roster, &[SlotName::Dst], Position::Defense);
        assert!(roster.assign_slot("K").is_err());
        assert!(roster.assign_slot("DST").is_err());
    }

    #[test]
    fn unknown_position_rejected() {
        let roster = Roster::new();
        assert_eq!(
            roster.assign_slot("LB").unwrap_err(),
            DraftError::UnknownPosition("LB".to_string())
        );
    }

    #[test]
    fn place_refuses_filled_slot() {
        let mut roster = Roster::new();
        roster
            .place(SlotName::Qb1, rostered("a", "BUF", Position::Quarterback))
            .unwrap();
        let err = roster
            .place(SlotName::Qb1, rostered("b", "KC", Position::Quarterback))
            .unwrap_err();
        assert_eq!(err, DraftError::SlotOccupied { slot: SlotName::Qb1 });
        assert_eq!(roster.slot(SlotName::Qb1).unwrap().player_id, "a");
    }

    #[test]
    fn has_player_and_team() {
        let mut roster = Roster::new();
        roster
            .place(SlotName::Wr1, rostered("p9", "DET", Position::WideReceiver))
            .unwrap();
        assert!(roster.has_player("p9"));
        assert!(!roster.has_player("p10"));
        assert!(roster.has_team("DET"));
        assert!(!roster.has_team("GB"));
        assert!(!roster.has_team(""));
    }

    #[test]
    fn iter_follows_display_order() {
        let roster = Roster::new();
        let names: Vec<&str> = roster.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "qb1", "qb2", "rb1", "rb2", "wr1", "wr2", "wr3", "te1", "fl1", "fl2", "fl3",
                "fl4", "kicker", "dst"
            ]
        );
    }

    #[test]
    fn roster_serializes_as_named_slots() {
        let mut roster = Roster::new();
        roster
            .place(SlotName::Kicker, rostered("k1", "BAL", Position::Kicker))
            .unwrap();
        let v = serde_json::to_value(&roster).unwrap();
        assert!(v["qb1"].is_null());
        assert_eq!(v["kicker"]["playerId"], "k1");
        assert_eq!(v["kicker"]["position"], "K");

        let back: Roster = serde_json::from_value(v).unwrap();
        assert_eq!(back, roster);
    }

    #[test]
    fn missing_slots_deserialize_as_empty() {
        let roster: Roster = serde_json::from_str("{}").unwrap();
        assert_eq!(roster.filled_count(), 0);
    }

    #[test]
    fn flex_slots_only_for_flex_positions() {
        for pos in Position::ALL {
            let has_flex = SlotName::priority_for(pos).contains(&SlotName::Fl1);
            assert_eq!(has_flex, pos.is_flex_eligible(), "{pos}");
        }
    }
}
