//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity the scripting core can name has a strongly-typed ID so that
//! an event carrying a `PlanetId` can never be handed a `FleetId` by mistake.
//! All IDs use UUID v7 (time-ordered), which keeps persisted documents sorted
//! by creation order when they are written back out.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a loaded game world. A script host binds to
    /// exactly one world for its active lifetime.
    WorldId
}

define_id! {
    /// Unique identifier for a player (human or AI empire).
    PlayerId
}

define_id! {
    /// Unique identifier for a fleet.
    FleetId
}

define_id! {
    /// Unique identifier for a planet.
    PlanetId
}

define_id! {
    /// Unique identifier for a building placed on a planet.
    BuildingId
}

define_id! {
    /// Unique identifier for a research (technology) type.
    ResearchId
}

define_id! {
    /// Unique identifier for an inventory item stationed at a planet.
    InventoryItemId
}

define_id! {
    /// Unique identifier for one battle (space or ground).
    BattleId
}

define_id! {
    /// Unique identifier for a combat unit inside a battle context.
    UnitId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let fleet = FleetId::new();
        let planet = PlanetId::new();
        assert_ne!(fleet.into_inner(), Uuid::nil());
        assert_ne!(planet.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_through_string() {
        let original = PlanetId::new();
        let parsed: Result<PlanetId, _> = original.to_string().parse();
        assert_eq!(parsed.ok(), Some(original));
    }

    #[test]
    fn id_parse_rejects_garbage() {
        let parsed: Result<FleetId, _> = "not-a-uuid".parse();
        assert!(parsed.is_err());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = BattleId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
