//! Configuration loading.
//!
//! Resolves the configuration path, creates a default file when none exists,
//! merges `geo.toml` coordinates and applies defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::{collect_warnings, validate_config};
use super::{Config, GeoConfig};
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Configuration directory chosen with `--config`, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
///
/// Can only be called once; later calls return an error.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The directory given with `--config`, if any.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of the main configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration, creating a default file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!("Created default configuration");
        log_indented!("{}", private_path(&config_path));
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load the configuration from a specific file.
///
/// Unlike [`load`] this never creates the file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    // geo.toml values are validated together with the rest
    load_geo_override_from_path(&mut config, path)?;

    validate_config(&config)?;

    let warnings = collect_warnings(&config);
    if !warnings.is_empty() {
        log_pipe!();
        for warning in warnings {
            log_warning!("{warning}");
        }
    }

    apply_defaults(&mut config);

    Ok(config)
}

/// Fill in every unset field except the coordinates.
pub(crate) fn apply_defaults(config: &mut Config) {
    config.enabled.get_or_insert(DEFAULT_ENABLED);
    config
        .schedule_automatic
        .get_or_insert(DEFAULT_SCHEDULE_AUTOMATIC);
    config.schedule_from.get_or_insert(DEFAULT_SCHEDULE_FROM);
    config.schedule_to.get_or_insert(DEFAULT_SCHEDULE_TO);
    config.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    config.smooth.get_or_insert(DEFAULT_SMOOTH);
    config
        .preview_duration
        .get_or_insert(DEFAULT_PREVIEW_DURATION);
}

/// Override coordinates from the `geo.toml` next to `config_path`.
///
/// A missing `geo.toml` is fine; an unreadable or malformed one is logged and
/// ignored.
pub(crate) fn load_geo_override_from_path(config: &mut Config, config_path: &Path) -> Result<()> {
    let Some(parent) = config_path.parent() else {
        return Ok(());
    };
    let geo_path = parent.join("geo.toml");

    if !geo_path.exists() {
        return Ok(());
    }

    match fs::read_to_string(&geo_path) {
        Ok(content) => match toml::from_str::<GeoConfig>(&content) {
            Ok(geo_config) => {
                if let Some(lat) = geo_config.latitude {
                    config.latitude = Some(lat);
                }
                if let Some(lon) = geo_config.longitude {
                    config.longitude = Some(lon);
                }
            }
            Err(e) => {
                log_warning!("Failed to parse geo.toml: {e}. Using coordinates from main config.");
            }
        },
        Err(e) => {
            log_warning!("Failed to read geo.toml: {e}. Using coordinates from main config.");
        }
    }

    Ok(())
}
