//! Implementation of the location command.
//!
//! Stores coordinates in the configuration and switches on the automatic
//! schedule. A running daemon picks the change up through its file watcher.

use anyhow::{Context, Result};

use crate::config::{self, Config};
use crate::geo::{SolarEvents, sunrise_sunset};
use crate::io::instance;
use crate::time::time_string_from_frac;

pub fn handle_location_command(latitude: f64, longitude: f64) -> Result<()> {
    log_version!();

    // Adopts the config directory of a running daemon
    let running = instance::get_running_instance()?;

    let config_path = Config::get_config_path()?;
    if !config_path.exists() {
        config::create_default_config(&config_path)?;
    }
    let config_dir = config_path
        .parent()
        .context("Could not determine config directory")?;

    config::update_coordinates(config_dir, latitude, longitude)?;

    if let Ok(SolarEvents::Daily { sunrise, sunset }) =
        sunrise_sunset(&chrono::Local::now(), latitude, longitude)
    {
        log_indented!(
            "Today: sunset {}, sunrise {}",
            time_string_from_frac(sunset),
            time_string_from_frac(sunrise)
        );
    }

    if let Some(info) = running {
        log_block_start!("Running instance (PID: {}) will reload automatically", info.pid);
    }
    log_end!();
    Ok(())
}
