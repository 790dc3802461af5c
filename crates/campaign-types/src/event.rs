//! The event envelope catalog.
//!
//! Every observable simulation occurrence that campaign scripts can react to
//! is one variant of [`ScriptEvent`]. Variants carry entity IDs rather than
//! entity values: the handler receives the live world alongside the envelope
//! and reads the entities from there, so it always sees the world exactly
//! as the [`EventTiming`] contract promises.
//!
//! [`EventKind`] is the field-less discriminant used for the dispatch table,
//! trigger configuration and diagnostics.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::ParseEnumError;
use crate::ids::{BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId};
use crate::structs::BattleInfo;

/// When an event is dispatched relative to the world mutation it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTiming {
    /// Dispatched before the mutation is committed: handlers observe the
    /// state as it is about to change.
    BeforeMutation,
    /// Dispatched after the mutation is committed: handlers observe the
    /// state as it now is.
    AfterMutation,
}

/// A single typed notification describing one simulation occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptEvent {
    /// A player finished researching a technology.
    Researched {
        /// The researching player.
        player: PlayerId,
        /// The completed research.
        research: ResearchId,
    },
    /// A player finished producing an item of a research type.
    Produced {
        /// The producing player.
        player: PlayerId,
        /// The produced type.
        research: ResearchId,
    },
    /// A fleet was destroyed by another fleet.
    Destroyed {
        /// The victorious fleet.
        winner: FleetId,
        /// The destroyed fleet.
        loser: FleetId,
    },
    /// A planet was colonized.
    Colonized {
        /// The colonized planet (already owned by the colonizer).
        planet: PlanetId,
    },
    /// A planet changed owner by force.
    Conquered {
        /// The conquered planet (already owned by the conqueror).
        planet: PlanetId,
        /// The owner before the conquest.
        previous_owner: PlayerId,
    },
    /// A player was eliminated.
    PlayerBeaten {
        /// The beaten player.
        player: PlayerId,
    },
    /// A player discovered a planet.
    DiscoveredPlanet {
        /// The discovering player.
        player: PlayerId,
        /// The discovered planet.
        planet: PlanetId,
    },
    /// A player discovered another player.
    DiscoveredPlayer {
        /// The discovering player.
        player: PlayerId,
        /// The discovered player.
        other: PlayerId,
    },
    /// A player discovered another player's fleet.
    DiscoveredFleet {
        /// The discovering player.
        player: PlayerId,
        /// The discovered fleet.
        fleet: FleetId,
    },
    /// A player lost sight of another player's fleet.
    LostSight {
        /// The observing player.
        player: PlayerId,
        /// The fleet that went out of sight.
        fleet: FleetId,
    },
    /// A fleet arrived at a map location.
    FleetAtPoint {
        /// The arriving fleet.
        fleet: FleetId,
        /// Map X coordinate.
        x: f64,
        /// Map Y coordinate.
        y: f64,
    },
    /// A fleet caught up with another fleet.
    FleetAtFleet {
        /// The pursuing fleet.
        fleet: FleetId,
        /// The fleet that was reached.
        other: FleetId,
    },
    /// A fleet reached a planet.
    FleetAtPlanet {
        /// The arriving fleet.
        fleet: FleetId,
        /// The planet reached.
        planet: PlanetId,
    },
    /// The diplomatic stance between two players changed.
    Stance {
        /// The player experiencing the change.
        first: PlayerId,
        /// The other player.
        second: PlayerId,
    },
    /// Two players allied against a common enemy.
    AllyAgainst {
        /// The first ally.
        first: PlayerId,
        /// The second ally.
        second: PlayerId,
        /// The common enemy.
        common_enemy: PlayerId,
    },
    /// A battle concluded and its results were applied.
    BattleComplete {
        /// The player being notified.
        player: PlayerId,
        /// The battle summary.
        battle: BattleInfo,
    },
    /// Simulation time progressed by one tick.
    Time,
    /// A building finished construction.
    BuildingComplete {
        /// The planet hosting the building.
        planet: PlanetId,
        /// The completed building.
        building: BuildingId,
    },
    /// A building was fully repaired.
    RepairComplete {
        /// The planet hosting the building.
        planet: PlanetId,
        /// The repaired building.
        building: BuildingId,
    },
    /// A building is about to be upgraded.
    Upgrading {
        /// The planet hosting the building.
        planet: PlanetId,
        /// The building, still at its pre-upgrade level.
        building: BuildingId,
        /// The level it is about to reach.
        new_level: u32,
    },
    /// An inventory item was added to a planet.
    InventoryAdd {
        /// The planet.
        planet: PlanetId,
        /// The added item.
        item: InventoryItemId,
    },
    /// An inventory item was removed from a planet.
    InventoryRemove {
        /// The planet.
        planet: PlanetId,
        /// The removed item (no longer stationed at the planet).
        item: InventoryItemId,
    },
    /// A planet is about to be lost by its owner.
    PlanetLost {
        /// The planet, still owned by the losing player.
        planet: PlanetId,
    },
    /// A fleet is about to be removed from the world.
    FleetLost {
        /// The fleet, still present in the world.
        fleet: FleetId,
    },
    /// A full-screen video finished playing.
    VideoComplete {
        /// The video resource id.
        video: String,
    },
    /// A sound finished playing.
    SoundComplete {
        /// The audio resource id.
        audio: String,
    },
    /// A planet became infected.
    PlanetInfected {
        /// The infected planet.
        planet: PlanetId,
    },
    /// A planet was cured of an infection.
    PlanetCured {
        /// The cured planet.
        planet: PlanetId,
    },
    /// The user watched a message.
    MessageSeen {
        /// The message id.
        id: String,
    },
    /// A new game started.
    NewGame,
    /// A campaign level jump occurred.
    LevelChanged,
}

impl ScriptEvent {
    /// Return the field-less discriminant of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Researched { .. } => EventKind::Researched,
            Self::Produced { .. } => EventKind::Produced,
            Self::Destroyed { .. } => EventKind::Destroyed,
            Self::Colonized { .. } => EventKind::Colonized,
            Self::Conquered { .. } => EventKind::Conquered,
            Self::PlayerBeaten { .. } => EventKind::PlayerBeaten,
            Self::DiscoveredPlanet { .. } => EventKind::DiscoveredPlanet,
            Self::DiscoveredPlayer { .. } => EventKind::DiscoveredPlayer,
            Self::DiscoveredFleet { .. } => EventKind::DiscoveredFleet,
            Self::LostSight { .. } => EventKind::LostSight,
            Self::FleetAtPoint { .. } => EventKind::FleetAtPoint,
            Self::FleetAtFleet { .. } => EventKind::FleetAtFleet,
            Self::FleetAtPlanet { .. } => EventKind::FleetAtPlanet,
            Self::Stance { .. } => EventKind::Stance,
            Self::AllyAgainst { .. } => EventKind::AllyAgainst,
            Self::BattleComplete { .. } => EventKind::BattleComplete,
            Self::Time => EventKind::Time,
            Self::BuildingComplete { .. } => EventKind::BuildingComplete,
            Self::RepairComplete { .. } => EventKind::RepairComplete,
            Self::Upgrading { .. } => EventKind::Upgrading,
            Self::InventoryAdd { .. } => EventKind::InventoryAdd,
            Self::InventoryRemove { .. } => EventKind::InventoryRemove,
            Self::PlanetLost { .. } => EventKind::PlanetLost,
            Self::FleetLost { .. } => EventKind::FleetLost,
            Self::VideoComplete { .. } => EventKind::VideoComplete,
            Self::SoundComplete { .. } => EventKind::SoundComplete,
            Self::PlanetInfected { .. } => EventKind::PlanetInfected,
            Self::PlanetCured { .. } => EventKind::PlanetCured,
            Self::MessageSeen { .. } => EventKind::MessageSeen,
            Self::NewGame => EventKind::NewGame,
            Self::LevelChanged => EventKind::LevelChanged,
        }
    }

    /// When this event is dispatched relative to its world mutation.
    pub const fn timing(&self) -> EventTiming {
        self.kind().timing()
    }
}

/// The discriminant of a [`ScriptEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// See [`ScriptEvent::Researched`].
    Researched,
    /// See [`ScriptEvent::Produced`].
    Produced,
    /// See [`ScriptEvent::Destroyed`].
    Destroyed,
    /// See [`ScriptEvent::Colonized`].
    Colonized,
    /// See [`ScriptEvent::Conquered`].
    Conquered,
    /// See [`ScriptEvent::PlayerBeaten`].
    PlayerBeaten,
    /// See [`ScriptEvent::DiscoveredPlanet`].
    DiscoveredPlanet,
    /// See [`ScriptEvent::DiscoveredPlayer`].
    DiscoveredPlayer,
    /// See [`ScriptEvent::DiscoveredFleet`].
    DiscoveredFleet,
    /// See [`ScriptEvent::LostSight`].
    LostSight,
    /// See [`ScriptEvent::FleetAtPoint`].
    FleetAtPoint,
    /// See [`ScriptEvent::FleetAtFleet`].
    FleetAtFleet,
    /// See [`ScriptEvent::FleetAtPlanet`].
    FleetAtPlanet,
    /// See [`ScriptEvent::Stance`].
    Stance,
    /// See [`ScriptEvent::AllyAgainst`].
    AllyAgainst,
    /// See [`ScriptEvent::BattleComplete`].
    BattleComplete,
    /// See [`ScriptEvent::Time`].
    Time,
    /// See [`ScriptEvent::BuildingComplete`].
    BuildingComplete,
    /// See [`ScriptEvent::RepairComplete`].
    RepairComplete,
    /// See [`ScriptEvent::Upgrading`].
    Upgrading,
    /// See [`ScriptEvent::InventoryAdd`].
    InventoryAdd,
    /// See [`ScriptEvent::InventoryRemove`].
    InventoryRemove,
    /// See [`ScriptEvent::PlanetLost`].
    PlanetLost,
    /// See [`ScriptEvent::FleetLost`].
    FleetLost,
    /// See [`ScriptEvent::VideoComplete`].
    VideoComplete,
    /// See [`ScriptEvent::SoundComplete`].
    SoundComplete,
    /// See [`ScriptEvent::PlanetInfected`].
    PlanetInfected,
    /// See [`ScriptEvent::PlanetCured`].
    PlanetCured,
    /// See [`ScriptEvent::MessageSeen`].
    MessageSeen,
    /// See [`ScriptEvent::NewGame`].
    NewGame,
    /// See [`ScriptEvent::LevelChanged`].
    LevelChanged,
}

impl EventKind {
    /// Every event kind, in catalog order.
    pub const ALL: [Self; 31] = [
        Self::Researched,
        Self::Produced,
        Self::Destroyed,
        Self::Colonized,
        Self::Conquered,
        Self::PlayerBeaten,
        Self::DiscoveredPlanet,
        Self::DiscoveredPlayer,
        Self::DiscoveredFleet,
        Self::LostSight,
        Self::FleetAtPoint,
        Self::FleetAtFleet,
        Self::FleetAtPlanet,
        Self::Stance,
        Self::AllyAgainst,
        Self::BattleComplete,
        Self::Time,
        Self::BuildingComplete,
        Self::RepairComplete,
        Self::Upgrading,
        Self::InventoryAdd,
        Self::InventoryRemove,
        Self::PlanetLost,
        Self::FleetLost,
        Self::VideoComplete,
        Self::SoundComplete,
        Self::PlanetInfected,
        Self::PlanetCured,
        Self::MessageSeen,
        Self::NewGame,
        Self::LevelChanged,
    ];

    /// When events of this kind are dispatched relative to their mutation.
    ///
    /// Only the three "imminent change" kinds run before the mutation.
    pub const fn timing(self) -> EventTiming {
        match self {
            Self::Upgrading | Self::PlanetLost | Self::FleetLost => EventTiming::BeforeMutation,
            _ => EventTiming::AfterMutation,
        }
    }

    /// Stable kebab-case name used in configuration documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Researched => "researched",
            Self::Produced => "produced",
            Self::Destroyed => "destroyed",
            Self::Colonized => "colonized",
            Self::Conquered => "conquered",
            Self::PlayerBeaten => "player-beaten",
            Self::DiscoveredPlanet => "discovered-planet",
            Self::DiscoveredPlayer => "discovered-player",
            Self::DiscoveredFleet => "discovered-fleet",
            Self::LostSight => "lost-sight",
            Self::FleetAtPoint => "fleet-at-point",
            Self::FleetAtFleet => "fleet-at-fleet",
            Self::FleetAtPlanet => "fleet-at-planet",
            Self::Stance => "stance",
            Self::AllyAgainst => "ally-against",
            Self::BattleComplete => "battle-complete",
            Self::Time => "time",
            Self::BuildingComplete => "building-complete",
            Self::RepairComplete => "repair-complete",
            Self::Upgrading => "upgrading",
            Self::InventoryAdd => "inventory-add",
            Self::InventoryRemove => "inventory-remove",
            Self::PlanetLost => "planet-lost",
            Self::FleetLost => "fleet-lost",
            Self::VideoComplete => "video-complete",
            Self::SoundComplete => "sound-complete",
            Self::PlanetInfected => "planet-infected",
            Self::PlanetCured => "planet-cured",
            Self::MessageSeen => "message-seen",
            Self::NewGame => "new-game",
            Self::LevelChanged => "level-changed",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "event kind",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_imminent_changes_run_before_mutation() {
        let before: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| kind.timing() == EventTiming::BeforeMutation)
            .collect();
        assert_eq!(
            before,
            vec![EventKind::Upgrading, EventKind::PlanetLost, EventKind::FleetLost]
        );
    }

    #[test]
    fn completed_changes_run_after_mutation() {
        for kind in [
            EventKind::BuildingComplete,
            EventKind::Researched,
            EventKind::Produced,
            EventKind::Colonized,
            EventKind::Conquered,
        ] {
            assert_eq!(kind.timing(), EventTiming::AfterMutation, "{kind}");
        }
    }

    #[test]
    fn event_reports_its_kind_and_timing() {
        let event = ScriptEvent::Upgrading {
            planet: PlanetId::new(),
            building: BuildingId::new(),
            new_level: 2,
        };
        assert_eq!(event.kind(), EventKind::Upgrading);
        assert_eq!(event.timing(), EventTiming::BeforeMutation);
        assert_eq!(ScriptEvent::Time.timing(), EventTiming::AfterMutation);
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("exploded".parse::<EventKind>().is_err());
    }
}
