//! Headless campaign harness.
//!
//! Loads a campaign document, runs it against the starting world with a
//! scripted player, and prints the final save snapshot as JSON.
//!
//! # Usage
//!
//! ```text
//! campaign-harness [CAMPAIGN_JSON] [TICKS]
//! ```
//!
//! `campaign.yaml` in the working directory configures the driver; without
//! it the defaults apply. Without a campaign path the bundled Pirate
//! Frontier mission runs.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `campaign.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the campaign document
//! 4. Create the starting world and start the campaign
//! 5. Play the requested number of ticks
//! 6. Log the outcome and print the final snapshot

mod error;
mod playthrough;

use std::path::{Path, PathBuf};

use anyhow::Context;
use campaign_sim::{LoggingConfig, Simulation, SimulationConfig};
use campaign_types::XElement;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::HarnessError;

/// The campaign played when no document is given.
const BUNDLED_CAMPAIGN: &str = include_str!("../../../demos/pirate-frontier.json");

/// Ticks played when no count is given.
const DEFAULT_TICKS: u64 = 12;

fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config.logging);
    info!(
        seed = config.world.seed,
        max_battle_ticks = config.battle.max_ticks,
        autosave_interval = config.autosave.interval_ticks,
        "campaign-harness starting"
    );

    let mut args = std::env::args().skip(1);
    let campaign = match args.next() {
        Some(path) => load_campaign(Path::new(&path))?,
        None => serde_json::from_str::<XElement>(BUNDLED_CAMPAIGN)
            .context("bundled campaign is not valid")?,
    };
    let ticks = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid tick count '{raw}'"))?,
        None => DEFAULT_TICKS,
    };

    let (world, ids) = campaign_world::create_starting_world().map_err(HarnessError::from)?;
    let mut sim = Simulation::new(world, config);
    sim.start(&campaign).map_err(HarnessError::from)?;

    let summary = playthrough::play(&mut sim, &ids, &campaign, ticks)?;
    for battle in &summary.battles {
        info!(
            battle = %battle.info.id,
            kind = battle.info.kind.as_str(),
            outcome = battle.info.outcome.as_str(),
            reward = battle.reward.as_ref().map(|r| r.background.as_str()),
            "battle"
        );
    }
    for objective in &summary.objectives {
        info!(
            objective = %objective.id,
            status = objective.status.as_str(),
            visible = objective.visible,
            "objective"
        );
    }
    for message in sim.host().receive_messages() {
        info!(message = %message.id, payload = %message.payload, "received message");
    }

    match sim.host().save() {
        Ok(snapshot) => {
            let json = serde_json::to_string_pretty(&snapshot)
                .context("failed to encode snapshot")?;
            println!("{json}");
        }
        Err(e) => warn!(error = %e, "final snapshot unavailable"),
    }

    sim.finish();
    info!(ticks = summary.ticks, "campaign-harness shutdown complete");
    Ok(())
}

/// Load `campaign.yaml` from the working directory, or use defaults.
fn load_config() -> Result<SimulationConfig, HarnessError> {
    let config_path = Path::new("campaign.yaml");
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read a campaign document from a JSON file.
fn load_campaign(path: &Path) -> Result<XElement, HarnessError> {
    let contents = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| HarnessError::Document {
        path: PathBuf::from(path),
        source,
    })
}
