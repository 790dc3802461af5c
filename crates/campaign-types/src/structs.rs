//! Core record types read by the UI and exchanged with the simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BattleKind, BattleOutcome, MessageAudience, ObjectiveStatus};
use crate::ids::{BattleId, FleetId, PlanetId, PlayerId};

// ---------------------------------------------------------------------------
// Video messages
// ---------------------------------------------------------------------------

/// A video message queued for the UI.
///
/// The payload is an opaque reference (typically a video resource name)
/// resolved by the asset layer, never by the scripting core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VideoMessage {
    /// Script-chosen identifier, unique within its queue.
    pub id: String,
    /// Which queue the message belongs to.
    pub audience: MessageAudience,
    /// Opaque payload reference handed to the UI.
    pub payload: String,
}

impl VideoMessage {
    /// Create a message for the given audience.
    pub fn new(id: &str, audience: MessageAudience, payload: &str) -> Self {
        Self {
            id: id.to_owned(),
            audience,
            payload: payload.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// A tracked mission goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Objective {
    /// Script-chosen identifier, unique within the objective list.
    pub id: String,
    /// Short title shown in the objective panel.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Current status.
    pub status: ObjectiveStatus,
    /// Whether the UI should list the objective.
    pub visible: bool,
}

impl Objective {
    /// Create a new visible, active objective.
    pub fn active(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
            status: ObjectiveStatus::Active,
            visible: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Battles
// ---------------------------------------------------------------------------

/// Summary of a concluded battle, as reported to scripts and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BattleInfo {
    /// The battle identifier.
    pub id: BattleId,
    /// Space or ground.
    pub kind: BattleKind,
    /// The attacking player.
    pub attacker: PlayerId,
    /// The attacking fleet.
    pub attacker_fleet: FleetId,
    /// The defending player, if the target was owned.
    pub defender: Option<PlayerId>,
    /// The defending fleet, for fleet-versus-fleet battles.
    pub defender_fleet: Option<FleetId>,
    /// The contested planet, for planetary assaults and ground battles.
    pub planet: Option<PlanetId>,
    /// How the battle concluded.
    pub outcome: BattleOutcome,
    /// Number of simulation steps the battle ran.
    pub steps: u32,
}

impl BattleInfo {
    /// The winning player, or `None` for aborted battles and for
    /// defender wins against an unowned target.
    pub const fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            BattleOutcome::AttackerWon => Some(self.attacker),
            BattleOutcome::DefenderWon => self.defender,
            BattleOutcome::Aborted => None,
        }
    }

    /// The losing player, or `None` for aborted battles.
    pub const fn loser(&self) -> Option<PlayerId> {
        match self.outcome {
            BattleOutcome::AttackerWon => self.defender,
            BattleOutcome::DefenderWon => Some(self.attacker),
            BattleOutcome::Aborted => None,
        }
    }

    /// Whether the given player took part on either side.
    pub fn involves(&self, player: PlayerId) -> bool {
        self.attacker == player || self.defender == Some(player)
    }
}

/// A special reward attached to a battle by the campaign script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BattleReward {
    /// Background image resource id for the results screen.
    pub background: String,
    /// Reward text shown to the player.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battle(outcome: BattleOutcome, defender: Option<PlayerId>) -> BattleInfo {
        BattleInfo {
            id: BattleId::new(),
            kind: BattleKind::Space,
            attacker: PlayerId::new(),
            attacker_fleet: FleetId::new(),
            defender,
            defender_fleet: Some(FleetId::new()),
            planet: None,
            outcome,
            steps: 3,
        }
    }

    #[test]
    fn winner_and_loser_follow_outcome() {
        let defender = PlayerId::new();
        let won = battle(BattleOutcome::AttackerWon, Some(defender));
        assert_eq!(won.winner(), Some(won.attacker));
        assert_eq!(won.loser(), Some(defender));

        let lost = battle(BattleOutcome::DefenderWon, Some(defender));
        assert_eq!(lost.winner(), Some(defender));
        assert_eq!(lost.loser(), Some(lost.attacker));
    }

    #[test]
    fn aborted_battle_has_no_winner() {
        let info = battle(BattleOutcome::Aborted, Some(PlayerId::new()));
        assert_eq!(info.winner(), None);
        assert_eq!(info.loser(), None);
    }

    #[test]
    fn involves_checks_both_sides() {
        let defender = PlayerId::new();
        let info = battle(BattleOutcome::AttackerWon, Some(defender));
        assert!(info.involves(info.attacker));
        assert!(info.involves(defender));
        assert!(!info.involves(PlayerId::new()));
    }
}
