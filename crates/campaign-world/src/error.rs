//! Error types for the `campaign-world` crate.
//!
//! All fallible world and battle operations return [`WorldError`] or
//! [`BattleError`] rather than panicking.

use campaign_types::{
    BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId, UnitId,
};

/// Errors that can occur during world-model operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A player was not found.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// A fleet was not found.
    #[error("fleet not found: {0}")]
    FleetNotFound(FleetId),

    /// A planet was not found.
    #[error("planet not found: {0}")]
    PlanetNotFound(PlanetId),

    /// A research type was not found.
    #[error("research not found: {0}")]
    ResearchNotFound(ResearchId),

    /// A building was not found on the given planet.
    #[error("building {building} not found on planet {planet}")]
    BuildingNotFound {
        /// The planet searched.
        planet: PlanetId,
        /// The missing building.
        building: BuildingId,
    },

    /// An inventory item was not found on the given planet.
    #[error("inventory item {item} not found on planet {planet}")]
    InventoryItemNotFound {
        /// The planet searched.
        planet: PlanetId,
        /// The missing item.
        item: InventoryItemId,
    },

    /// A duplicate entity was inserted where uniqueness is required.
    #[error("duplicate entity id: {0}")]
    Duplicate(String),

    /// The planet is owned and cannot be colonized.
    #[error("planet {0} is already owned")]
    PlanetAlreadyOwned(PlanetId),

    /// The planet has no owner to lose or be conquered from.
    #[error("planet {0} has no owner")]
    PlanetUnowned(PlanetId),

    /// An upgrade must raise the level.
    #[error("building {building} cannot go from level {current} to {requested}")]
    InvalidUpgrade {
        /// The building.
        building: BuildingId,
        /// Its current level.
        current: u32,
        /// The requested level.
        requested: u32,
    },

    /// The building has not finished construction.
    #[error("building {0} is still under construction")]
    BuildingIncomplete(BuildingId),

    /// The building has already finished construction.
    #[error("building {0} is already complete")]
    BuildingAlreadyComplete(BuildingId),

    /// Map coordinates must be finite.
    #[error("fleet {0} cannot be placed at a non-finite position")]
    NonFinitePosition(FleetId),

    /// A player cannot take a planet it already owns.
    #[error("player {player} already owns planet {planet}")]
    AlreadyOwner {
        /// The planet.
        planet: PlanetId,
        /// Its owner.
        player: PlayerId,
    },
}

/// Errors raised by the guarded battle-context API.
///
/// These protect combat invariants established by the combat driver from
/// script-side mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// Units cannot be added once placements are finalized.
    #[error("placements are finalized; no further units may be added")]
    PlacementsFinalized,

    /// The battle cannot start before placements are finalized.
    #[error("placements are not finalized yet")]
    PlacementsOpen,

    /// The unit does not take part in this battle.
    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Destroyed units stay destroyed.
    #[error("unit {0} is destroyed and cannot be restored")]
    UnitDestroyed(UnitId),

    /// Hitpoints cannot exceed the unit's maximum.
    #[error("unit {unit} cannot have {requested} hitpoints (maximum {maximum})")]
    HitpointsExceedMaximum {
        /// The unit.
        unit: UnitId,
        /// The requested value.
        requested: u32,
        /// The unit's maximum.
        maximum: u32,
    },

    /// The battle already has an outcome.
    #[error("battle already concluded")]
    AlreadyConcluded,

    /// The battle has no outcome yet.
    #[error("battle not concluded yet")]
    NotConcluded,
}
