//! Campaign script host.
//!
//! A [`ScriptHost`] binds one campaign script to one world for the length of
//! a campaign session. The simulation drives it from outside: it dispatches
//! events around its world mutations, brackets every battle with the
//! start / step / finish phase calls, and asks the policy queries before it
//! lets the player command a fleet, autosaves, or shows battle results. The
//! host owns the script's message queues and objective list and persists them
//! together with the script's private state.
//!
//! Scripts implement [`CampaignScript`]. Two ship with the host: the
//! data-driven [`MissionScript`] and the free-play [`SkirmishScript`]; the
//! configuration's `variant` attribute selects between them.
//!
//! # Modules
//!
//! - [`host`] -- Lifecycle and transactional save / load
//! - [`dispatch`] -- Event delivery and envelope validation
//! - [`battle`] -- Space and ground battle phase bridge
//! - [`policy`] -- Fleet control, autosave and battle reward queries
//! - [`script`] -- The [`CampaignScript`] trait and its [`ScriptContext`]
//! - [`stores`] -- Message queues and the objective list
//! - [`config`] -- Campaign configuration parsing
//! - [`mission`] -- Trigger-driven mission script
//! - [`skirmish`] -- Defeat-all-rivals script
//! - [`error`] -- [`ScriptError`] and [`StoreError`]

pub mod battle;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod mission;
pub mod policy;
pub mod script;
pub mod skirmish;
pub mod stores;

pub use battle::BattlePhase;
pub use config::{CONFIG_ROOT, ScriptConfig, ScriptVariant};
pub use dispatch::{DispatchOutcome, DispatchStats, validate_envelope};
pub use error::{ScriptError, StoreError};
pub use host::{HostOptions, LifecycleState, STATE_ROOT, ScriptHost};
pub use mission::MissionScript;
pub use script::{CampaignScript, EventDisposition, ScriptContext};
pub use skirmish::{DEFEAT_ALL_RIVALS, SkirmishScript};
pub use stores::{MessageQueue, ObjectiveList, objective_from_node};
