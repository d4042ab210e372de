//! Configuration system for nightlightd.
//!
//! Settings live in a TOML file, by default
//! `$XDG_CONFIG_HOME/nightlightd/nightlightd.toml`. A missing file is created
//! from a commented template on first load.
//!
//! ```toml
//! #[Schedule]
//! enabled = false             # Turn night light on
//! schedule_automatic = true   # Use sunset/sunrise at the configured location
//! schedule_from = 20.0        # Manual start of the night, fractional hours (0-24)
//! schedule_to = 6.0           # Manual end of the night, fractional hours (0-24)
//!
//! #[Color]
//! temperature = 2700          # Night color temperature (1000-10000) Kelvin
//! smooth = true               # Fade temperature changes over 5 seconds
//! preview_duration = 5        # Length of a preview in seconds (1-120)
//!
//! #[Location]
//! latitude = 51.5             # Degrees north
//! longitude = -0.1278         # Degrees east
//! ```
//!
//! Coordinates may instead be kept in a `geo.toml` next to the main file, so
//! the main configuration can be shared without revealing the location.
//! Values in `geo.toml` take precedence.
//!
//! ## Validation
//!
//! Temperatures outside 1000-10000K, schedule hours outside [0, 24) and
//! unknown keys are rejected. Out-of-range coordinates only produce a warning;
//! the schedule then falls back to the manual hours at runtime.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::constants::*;
use crate::core::ScheduleConfig;
use crate::time::time_string_from_frac;

pub use builder::{create_default_config, update_coordinates};
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Coordinates kept in a separate `geo.toml`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeoConfig {
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
}

/// Settings loaded from `nightlightd.toml`.
///
/// Every field is optional in the file; [`loading::load_from_path`] fills in
/// the defaults, so a loaded `Config` always has every field set.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Whether night light is switched on at all
    pub enabled: Option<bool>,
    /// Follow sunset/sunrise instead of the manual hours
    pub schedule_automatic: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Start of the night window in fractional hours
    pub schedule_from: Option<f64>,
    /// End of the night window in fractional hours
    pub schedule_to: Option<f64>,
    /// Night color temperature in Kelvin
    pub temperature: Option<u32>,
    /// Fade temperature changes instead of jumping
    pub smooth: Option<bool>,
    /// Seconds a preview forces the night temperature
    pub preview_duration: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Schedule settings handed to the engine.
    ///
    /// Missing coordinates map to an out-of-range sentinel so that automatic
    /// mode falls back to the manual hours.
    pub fn to_schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            enabled: self.enabled.unwrap_or(DEFAULT_ENABLED),
            automatic: self
                .schedule_automatic
                .unwrap_or(DEFAULT_SCHEDULE_AUTOMATIC),
            latitude: self.latitude.unwrap_or(COORDINATES_UNSET.0),
            longitude: self.longitude.unwrap_or(COORDINATES_UNSET.1),
            manual_from: self.schedule_from.unwrap_or(DEFAULT_SCHEDULE_FROM),
            manual_to: self.schedule_to.unwrap_or(DEFAULT_SCHEDULE_TO),
            target_temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }

    pub fn smooth_enabled(&self) -> bool {
        self.smooth.unwrap_or(DEFAULT_SMOOTH)
    }

    pub fn preview_duration(&self) -> Duration {
        Duration::from_secs(self.preview_duration.unwrap_or(DEFAULT_PREVIEW_DURATION))
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        let enabled = self.enabled.unwrap_or(DEFAULT_ENABLED);
        log_indented!("Night light: {}", if enabled { "enabled" } else { "disabled" });

        let automatic = self
            .schedule_automatic
            .unwrap_or(DEFAULT_SCHEDULE_AUTOMATIC);
        match (automatic, self.latitude, self.longitude) {
            (true, Some(lat), Some(lon)) => {
                let lat_dir = if lat >= 0.0 { "N" } else { "S" };
                let lon_dir = if lon >= 0.0 { "E" } else { "W" };
                log_indented!("Schedule: sunset to sunrise");
                log_indented!(
                    "Location: {:.3}°{}, {:.3}°{}",
                    lat.abs(),
                    lat_dir,
                    lon.abs(),
                    lon_dir
                );
            }
            (true, _, _) => {
                log_indented!("Schedule: sunset to sunrise (no location, using manual hours)");
            }
            (false, _, _) => log_indented!("Schedule: manual"),
        }

        log_indented!(
            "Manual hours: {} to {}",
            time_string_from_frac(self.schedule_from.unwrap_or(DEFAULT_SCHEDULE_FROM)),
            time_string_from_frac(self.schedule_to.unwrap_or(DEFAULT_SCHEDULE_TO))
        );
        log_indented!(
            "Temperature: {}K",
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
        );
        log_indented!(
            "Smoothing: {}",
            if self.smooth_enabled() { "on" } else { "off" }
        );
    }
}
