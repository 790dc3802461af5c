//! World model and battle contexts for the campaign scripting core.
//!
//! The scripting core never owns the world; it reads it through shared
//! references passed into every dispatch, phase and policy call. This crate
//! defines that interface boundary: the entity records, the [`World`]
//! container with its fallible mutations, and the guarded battle contexts
//! handed to scripts during space and ground combat.
//!
//! # Modules
//!
//! - [`entities`] -- Players, fleets, planets, buildings, research, inventory
//! - [`world`] -- The [`World`] container and its mutations
//! - [`battle`] -- [`SpaceBattle`] / [`GroundBattle`] combat contexts
//! - [`starting_world`] -- The default pirate-frontier world
//! - [`error`] -- [`WorldError`] and [`BattleError`]

pub mod battle;
pub mod entities;
pub mod error;
pub mod starting_world;
pub mod world;

pub use battle::{Battle, Combat, CombatUnit, GroundBattle, Side, SpaceBattle};
pub use entities::{
    ALLIED_STANCE, Building, Fleet, InventoryItem, Planet, Player, ResearchType, Ship,
};
pub use error::{BattleError, WorldError};
pub use starting_world::{StartingIds, create_starting_world};
pub use world::World;
