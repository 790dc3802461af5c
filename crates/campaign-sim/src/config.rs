//! Runtime configuration for the simulation driver.
//!
//! The canonical file is `campaign.yaml`. Every field has a default, so an
//! empty document is a valid configuration:
//!
//! ```yaml
//! world:
//!   seed: 7
//! battle:
//!   max_ticks: 50
//! autosave:
//!   interval_ticks: 10
//! scripting:
//!   warn_unhandled: true
//! logging:
//!   level: debug
//! ```
//!
//! `CAMPAIGN_LOG` overrides `logging.level` when set.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Combat driver settings.
    #[serde(default)]
    pub battle: BattleConfig,

    /// Autosave scheduling.
    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// Script host switches.
    #[serde(default)]
    pub scripting: ScriptingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for combat rolls; the same seed replays the same battles.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Combat driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BattleConfig {
    /// Steps after which an undecided battle is aborted.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,

    /// Lower bound of the damage roll, in percent of a unit's attack.
    #[serde(default = "default_min_damage_percent")]
    pub min_damage_percent: u32,

    /// Upper bound of the damage roll, in percent of a unit's attack.
    #[serde(default = "default_max_damage_percent")]
    pub max_damage_percent: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            min_damage_percent: default_min_damage_percent(),
            max_damage_percent: default_max_damage_percent(),
        }
    }
}

/// Autosave configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutosaveConfig {
    /// Whether the driver autosaves at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Autosave every N ticks.
    #[serde(default = "default_autosave_interval")]
    pub interval_ticks: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: default_autosave_interval(),
        }
    }
}

/// Script host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScriptingConfig {
    /// Log events the script does not handle at warn level.
    #[serde(default)]
    pub warn_unhandled: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Override the level with `CAMPAIGN_LOG` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CAMPAIGN_LOG") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u32 {
    100
}

const fn default_min_damage_percent() -> u32 {
    50
}

const fn default_max_damage_percent() -> u32 {
    150
}

const fn default_true() -> bool {
    true
}

const fn default_autosave_interval() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
