//! Simulation driver for the campaign scripting core.
//!
//! Owns the tick loop around a [`World`](campaign_world::World) and a
//! [`ScriptHost`](campaign_script::ScriptHost). Every world mutation a
//! script can observe is committed around its event in the order the event's
//! timing requires. Player commands (move and attack orders) and autosave
//! ask the script first, and the combat drivers bracket each battle with the host's phase calls.
//!
//! # Modules
//!
//! - [`simulation`] -- The [`Simulation`] context, tick loop and world operations
//! - [`combat`] -- Space, orbital and ground combat drivers
//! - [`commit`] -- Event-ordered world commits
//! - [`clock`] -- Tick counter and scheduling
//! - [`config`] -- YAML runtime configuration
//! - [`error`] -- [`SimError`]

pub mod clock;
pub mod combat;
pub mod commit;
pub mod config;
pub mod error;
pub mod simulation;

pub use clock::{ClockError, SimClock};
pub use combat::{AttackOutcome, AttackTarget, BattleReport};
pub use commit::{commit_if_changed, commit_with_event, notify};
pub use config::{
    AutosaveConfig, BattleConfig, ConfigError, LoggingConfig, ScriptingConfig, SimulationConfig,
    WorldConfig,
};
pub use error::SimError;
pub use simulation::{CommandOutcome, Simulation, TickReport};
