//! Configuration file creation and in-place updates.
//!
//! New files are produced by [`ConfigBuilder`], which aligns the trailing
//! comments of all settings into one column. Updates rewrite single lines
//! and keep the user's comment layout.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::geo::coordinates_valid;

/// Write the commented default configuration to `path`.
///
/// Coordinates are left out, so the automatic schedule uses the manual hours
/// until a location is configured.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let config_content = ConfigBuilder::new()
        .add_section("Schedule")
        .add_setting(
            "enabled",
            &DEFAULT_ENABLED.to_string(),
            "Turn night light on",
        )
        .add_setting(
            "schedule_automatic",
            &DEFAULT_SCHEDULE_AUTOMATIC.to_string(),
            "Use sunset/sunrise at the configured location",
        )
        .add_setting(
            "schedule_from",
            &format!("{DEFAULT_SCHEDULE_FROM:.1}"),
            "Manual start of the night, fractional hours (0-24)",
        )
        .add_setting(
            "schedule_to",
            &format!("{DEFAULT_SCHEDULE_TO:.1}"),
            "Manual end of the night, fractional hours (0-24)",
        )
        .add_section("Color")
        .add_setting(
            "temperature",
            &DEFAULT_TEMPERATURE.to_string(),
            &format!("Night color temperature ({TEMPERATURE_MIN}-{TEMPERATURE_MAX}) Kelvin"),
        )
        .add_setting(
            "smooth",
            &DEFAULT_SMOOTH.to_string(),
            "Fade temperature changes over 5 seconds",
        )
        .add_setting(
            "preview_duration",
            &DEFAULT_PREVIEW_DURATION.to_string(),
            &format!("Length of a preview in seconds (1-{MAXIMUM_PREVIEW_DURATION})"),
        )
        .add_section("Location")
        .add_comment("latitude = 51.5             # Degrees north")
        .add_comment("longitude = -0.1278         # Degrees east")
        .build();

    fs::write(path, config_content).context("Failed to write default config file")?;
    Ok(())
}

/// Store new coordinates in the configuration found in `config_dir`.
///
/// If a `geo.toml` exists the coordinates go there, otherwise the
/// `latitude`/`longitude` lines of the main file are rewritten (or appended).
/// The automatic schedule is switched on in both cases.
pub fn update_coordinates(config_dir: &Path, latitude: f64, longitude: f64) -> Result<()> {
    if !coordinates_valid(latitude, longitude) {
        anyhow::bail!(
            "Coordinates out of range: latitude must be -90..90 and longitude -180..180 (got {latitude}, {longitude})"
        );
    }

    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let geo_path = config_dir.join("geo.toml");

    if !config_path.exists() {
        anyhow::bail!("No config file found at {}", private_path(&config_path));
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {}", private_path(&config_path)))?;
    let mut updated_content = content.clone();

    if geo_path.exists() {
        let geo_content = format!(
            "#[Private geo coordinates]\nlatitude = {latitude:.6}\nlongitude = {longitude:.6}\n"
        );
        fs::write(&geo_path, geo_content)
            .with_context(|| format!("Failed to write coordinates to {}", private_path(&geo_path)))?;
    } else {
        let lat_value = format!("{latitude:.6}");
        let lon_value = format!("{longitude:.6}");
        let lat_line = find_config_line(&content, "latitude");
        let lon_line = find_config_line(&content, "longitude");

        // Keep both comments in one column
        let target_column = match (&lat_line, &lon_line) {
            (Some(lat), Some(lon)) => {
                let lat_pos = lat.find('#').unwrap_or(lat.len());
                let lon_pos = lon.find('#').unwrap_or(lon.len());
                lat_pos.max(lon_pos)
            }
            (Some(line), None) | (None, Some(line)) => line.find('#').unwrap_or(25),
            (None, None) => 25,
        };

        if let Some(ref line) = lat_line {
            let new_line = align_comment_to_column(line, "latitude", &lat_value, target_column);
            updated_content = updated_content.replace(line, &new_line);
        }
        if let Some(ref line) = lon_line {
            let new_line = align_comment_to_column(line, "longitude", &lon_value, target_column);
            updated_content = updated_content.replace(line, &new_line);
        }

        if lat_line.is_none() || lon_line.is_none() {
            if !updated_content.ends_with('\n') {
                updated_content.push('\n');
            }
            if lat_line.is_none() {
                updated_content.push_str(&format!("latitude = {lat_value}\n"));
            }
            if lon_line.is_none() {
                updated_content.push_str(&format!("longitude = {lon_value}\n"));
            }
        }
    }

    if let Some(mode_line) = find_config_line(&updated_content, "schedule_automatic") {
        let new_mode_line = preserve_comment_formatting(&mode_line, "schedule_automatic", "true");
        updated_content = updated_content.replace(&mode_line, &new_mode_line);
    } else {
        if !updated_content.ends_with('\n') {
            updated_content.push('\n');
        }
        updated_content.push_str("schedule_automatic = true\n");
    }

    if updated_content != content {
        fs::write(&config_path, updated_content).with_context(|| {
            format!(
                "Failed to write updated config to {}",
                private_path(&config_path)
            )
        })?;
    }

    let target = if geo_path.exists() {
        &geo_path
    } else {
        &config_path
    };
    log_block_start!("Updated coordinates in {}", private_path(target));
    log_indented!("Latitude: {latitude:.6}");
    log_indented!("Longitude: {longitude:.6}");

    Ok(())
}

/// Builder for configuration files with aligned comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
    Comment(String),
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A commented-out line, emitted verbatim after `# `.
    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(ConfigEntry::Comment(format!("# {text}")));
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
                ConfigEntry::Comment(text) => result.push(text),
            }
        }

        let mut output = result.join("\n");
        output.push('\n');
        output
    }
}

/// First uncommented line assigning `key`.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with('#')
                && trimmed
                    .split('=')
                    .next()
                    .is_some_and(|lhs| lhs.trim() == key)
                && trimmed.contains('=')
        })
        .map(str::to_string)
}

/// Replace the value of a config line, keeping the spacing before its comment.
pub(crate) fn preserve_comment_formatting(
    original_line: &str,
    key: &str,
    new_value: &str,
) -> String {
    let key_value_part = format!("{key} = {new_value}");

    if let Some(comment_pos) = original_line.find('#') {
        let comment_part = &original_line[comment_pos..];
        let before_comment = &original_line[..comment_pos];
        let original_spacing = before_comment
            .rfind(|c: char| !c.is_whitespace())
            .map(|last| &before_comment[last + 1..])
            .unwrap_or(" ");

        format!("{key_value_part}{original_spacing}{comment_part}")
    } else {
        key_value_part
    }
}

/// Replace the value of a config line, moving its comment to `target_column`.
fn align_comment_to_column(
    original_line: &str,
    key: &str,
    new_value: &str,
    target_column: usize,
) -> String {
    let key_value_part = format!("{key} = {new_value}");

    if let Some(comment_pos) = original_line.find('#') {
        let comment_part = &original_line[comment_pos..];
        let padding = target_column.saturating_sub(key_value_part.len()).max(1);
        format!("{key_value_part}{}{comment_part}", " ".repeat(padding))
    } else {
        key_value_part
    }
}
