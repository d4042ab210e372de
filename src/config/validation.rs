//! Configuration validation.
//!
//! Hard errors for values the engine cannot work with, warnings for values it
//! can recover from at runtime.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;
use crate::geo::coordinates_valid;

/// Reject values the schedule engine cannot use.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(temp) = config.temperature
        && !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&temp)
    {
        anyhow::bail!(
            "temperature ({}) must be between {} and {} Kelvin",
            temp,
            TEMPERATURE_MIN,
            TEMPERATURE_MAX
        );
    }

    if let Some(from) = config.schedule_from {
        validate_schedule_hour(from, "schedule_from")?;
    }
    if let Some(to) = config.schedule_to {
        validate_schedule_hour(to, "schedule_to")?;
    }

    if let Some(duration) = config.preview_duration
        && !(1..=MAXIMUM_PREVIEW_DURATION).contains(&duration)
    {
        anyhow::bail!(
            "preview_duration ({} seconds) must be between 1 and {} seconds",
            duration,
            MAXIMUM_PREVIEW_DURATION
        );
    }

    if config.latitude.is_some() != config.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    Ok(())
}

/// Non-fatal problems, each rendered as a log line.
pub fn collect_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if let (Some(lat), Some(lon)) = (config.latitude, config.longitude)
        && !coordinates_valid(lat, lon)
    {
        warnings.push(format!(
            "Coordinates {lat}, {lon} are out of range, using the manual schedule"
        ));
    }

    if config.schedule_automatic.unwrap_or(DEFAULT_SCHEDULE_AUTOMATIC)
        && (config.latitude.is_none() || config.longitude.is_none())
    {
        warnings.push(
            "Automatic schedule needs latitude and longitude, using the manual schedule"
                .to_string(),
        );
    }

    warnings
}

/// Schedule hours are fractional hours of a day, in [0, 24).
pub(crate) fn validate_schedule_hour(hour: f64, field_name: &str) -> Result<()> {
    if !(0.0..24.0).contains(&hour) {
        anyhow::bail!(
            "{} ({}) must be a fractional hour between 0 and 24",
            field_name,
            hour
        );
    }
    Ok(())
}
