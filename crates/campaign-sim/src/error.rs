//! Error type for the simulation driver.

use campaign_script::ScriptError;
use campaign_types::EventKind;
use campaign_world::{BattleError, WorldError};

use crate::clock::ClockError;

/// Errors returned by [`Simulation`](crate::Simulation) operations.
///
/// Script misbehavior never surfaces here: the host logs it and the tick
/// continues. These are failures of the driver's own inputs.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A world mutation was refused.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A combat context refused an operation.
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// The script host refused to start or persist.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The clock could not advance.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// A conditional commit was asked to carry a before-mutation event.
    #[error("{kind} is dispatched before its mutation and cannot be committed conditionally")]
    TimingMismatch {
        /// The offending event kind.
        kind: EventKind,
    },

    /// A battle was requested that cannot take place.
    #[error("invalid battle: {reason}")]
    InvalidBattle {
        /// Why the battle was refused.
        reason: String,
    },
}
