//! Error types for the harness binary.
//!
//! [`HarnessError`] wraps every failure the playthrough can hit so that
//! `main` can propagate it with `?`.

use std::path::PathBuf;

/// Top-level error for the harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: campaign_sim::ConfigError,
    },

    /// Starting world construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: campaign_world::WorldError,
    },

    /// The simulation refused an operation.
    #[error("simulation error: {source}")]
    Sim {
        /// The underlying simulation error.
        #[from]
        source: campaign_sim::SimError,
    },

    /// A campaign document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A campaign document is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Document {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
