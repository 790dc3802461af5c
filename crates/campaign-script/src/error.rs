//! Error types for the campaign-script crate.
//!
//! Only configuration and persistence failures are hard errors the caller
//! must handle. Lifecycle misuse is returned where an operation has a result
//! to return, and is otherwise logged. Failures inside script handlers never
//! unwind past the host.

use campaign_types::DocumentError;
use campaign_world::BattleError;

/// Errors surfaced by the script host and by script implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The configuration document passed to `init` is malformed. The host
    /// stays uninitialized.
    #[error("invalid campaign configuration: {reason}")]
    Config {
        /// What was wrong with the document.
        reason: String,
    },

    /// A persisted snapshot could not be loaded. The previous script state
    /// is preserved.
    #[error("corrupt script state: {reason}")]
    CorruptState {
        /// What was wrong with the snapshot.
        reason: String,
    },

    /// An operation was called in a lifecycle or battle phase that does not
    /// allow it.
    #[error("lifecycle misuse in {operation}: {reason}")]
    Lifecycle {
        /// The operation that was refused.
        operation: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// A battle context rejected the request.
    #[error("battle context error: {0}")]
    Battle(#[from] BattleError),

    /// A script hook failed. The host logs this and carries on.
    #[error("script handler failed: {0}")]
    Handler(String),
}

impl ScriptError {
    /// Wrap a configuration problem.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Wrap a persistence problem.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptState {
            reason: reason.into(),
        }
    }

    /// Build a lifecycle misuse error.
    pub fn lifecycle(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Lifecycle {
            operation,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the message and objective stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A message with this id is already queued.
    #[error("message '{0}' is already queued")]
    DuplicateMessage(String),

    /// An objective with this id already exists.
    #[error("objective '{0}' already exists")]
    DuplicateObjective(String),

    /// No objective has this id.
    #[error("objective '{0}' not found")]
    UnknownObjective(String),

    /// The objective is already completed or failed.
    #[error("objective '{0}' is already completed or failed")]
    AlreadyTerminal(String),

    /// Only completed or failed objectives can be retired.
    #[error("objective '{0}' is still active")]
    StillActive(String),

    /// A persisted store could not be read back.
    #[error(transparent)]
    Document(#[from] DocumentError),
}
