//! Enumeration types shared across the campaign scripting core.
//!
//! Every enum that is written into a persisted document has a stable
//! lowercase text form ([`as_str`](ObjectiveStatus::as_str)) and a matching
//! [`FromStr`] implementation so that documents survive renames of the Rust
//! variants.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error returned when a persisted enum value does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    /// The enum being parsed (e.g. `"objective status"`).
    pub kind: &'static str,
    /// The offending text.
    pub value: String,
}

impl ParseEnumError {
    /// Build the error for an unrecognized value.
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// Status of a mission objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ObjectiveStatus {
    /// The objective is in progress.
    Active,
    /// The objective was achieved.
    Completed,
    /// The objective can no longer be achieved.
    Failed,
}

impl ObjectiveStatus {
    /// Whether the status is final (completed or failed).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Stable text form used in persisted documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for ObjectiveStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ParseEnumError::new("objective status", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Video messages
// ---------------------------------------------------------------------------

/// Which of the two message queues a video message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MessageAudience {
    /// A message the player may send to another party.
    Send,
    /// A message the player receives.
    Receive,
}

impl MessageAudience {
    /// Stable text form used in persisted documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl FromStr for MessageAudience {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            other => Err(ParseEnumError::new("message audience", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Battles
// ---------------------------------------------------------------------------

/// The two nested combat sub-simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BattleKind {
    /// Fleet-versus-fleet (or fleet-versus-planet defenses) combat.
    Space,
    /// Surface combat on a planet.
    Ground,
}

impl BattleKind {
    /// Stable text form used in persisted documents and config.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Ground => "ground",
        }
    }
}

impl FromStr for BattleKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "space" => Ok(Self::Space),
            "ground" => Ok(Self::Ground),
            other => Err(ParseEnumError::new("battle kind", other)),
        }
    }
}

/// How a battle concluded.
///
/// An aborted battle (retreat, tick limit) still goes through the finish
/// phase and carries this flag instead of a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BattleOutcome {
    /// The attacking side eliminated the defenders.
    AttackerWon,
    /// The defending side eliminated the attackers.
    DefenderWon,
    /// The battle ended without a decision.
    Aborted,
}

impl BattleOutcome {
    /// Stable text form used in persisted documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AttackerWon => "attacker-won",
            Self::DefenderWon => "defender-won",
            Self::Aborted => "aborted",
        }
    }
}

impl FromStr for BattleOutcome {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attacker-won" => Ok(Self::AttackerWon),
            "defender-won" => Ok(Self::DefenderWon),
            "aborted" => Ok(Self::Aborted),
            other => Err(ParseEnumError::new("battle outcome", other)),
        }
    }
}
