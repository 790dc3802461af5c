//! Shared type definitions for the campaign scripting core.
//!
//! This crate is the leaf layer of the workspace: it holds plain data and no
//! behavior beyond parsing and formatting. UI-facing types flow downstream to
//! `TypeScript` via `ts-rs` so the UI layer can render objectives and message
//! queues from read-only snapshots.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Objective status, message audience, battle kind/outcome
//! - [`structs`] -- Video messages, objectives, battle summaries and rewards
//! - [`event`] -- The [`ScriptEvent`] envelope catalog and its timing rules
//! - [`document`] -- The [`XElement`] tree used for config and persistence

pub mod document;
pub mod enums;
pub mod event;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use document::{DocumentError, XElement};
pub use enums::{BattleKind, BattleOutcome, MessageAudience, ObjectiveStatus, ParseEnumError};
pub use event::{EventKind, EventTiming, ScriptEvent};
pub use ids::{
    BattleId, BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId, UnitId,
    WorldId,
};
pub use structs::{BattleInfo, BattleReward, Objective, VideoMessage};
