//! Implementation of the sun command.
//!
//! Prints sunrise and sunset for the configured coordinates, today or on a
//! given date, in the local timezone.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::config::Config;
use crate::geo::{SolarEvents, sunrise_sunset};
use crate::time::time_string_from_frac;

pub fn handle_sun_command(date: Option<NaiveDate>) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let (Some(latitude), Some(longitude)) = (config.latitude, config.longitude) else {
        log_block_start!("No location configured");
        log_indented!("Set one with: nightlightd location <latitude> <longitude>");
        log_end!();
        return Ok(());
    };

    let at = match date {
        Some(date) => local_noon(date)?,
        None => Local::now(),
    };
    let events = sunrise_sunset(&at, latitude, longitude)?;

    log_block_start!(
        "{} at {:.4}, {:.4}",
        at.format("%Y-%m-%d"),
        latitude,
        longitude
    );
    for line in describe(events) {
        log_indented!("{line}");
    }
    log_end!();
    Ok(())
}

/// Noon on `date` in the local timezone; noon is never skipped by DST.
fn local_noon(date: NaiveDate) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN + chrono::Duration::hours(12)))
        .earliest()
        .with_context(|| format!("{date} has no local noon"))
}

/// Human readable lines for a solar calculation result.
pub(crate) fn describe(events: SolarEvents) -> Vec<String> {
    match events {
        SolarEvents::Daily { sunrise, sunset } => vec![
            format!("Sunrise: {}", time_string_from_frac(sunrise)),
            format!("Sunset: {}", time_string_from_frac(sunset)),
            format!("Daylight: {}", time_string_from_frac(sunset - sunrise)),
        ],
        SolarEvents::PolarDay => vec!["The sun does not set on this day".to_string()],
        SolarEvents::PolarNight => vec!["The sun does not rise on this day".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_daily() {
        let lines = describe(SolarEvents::Daily {
            sunrise: 7.5,
            sunset: 17.25,
        });
        assert_eq!(lines, vec!["Sunrise: 07:30", "Sunset: 17:15", "Daylight: 09:45"]);
    }

    #[test]
    fn test_describe_polar() {
        assert_eq!(describe(SolarEvents::PolarDay).len(), 1);
        assert!(describe(SolarEvents::PolarNight)[0].contains("does not rise"));
    }

    #[test]
    fn test_local_noon() {
        let date = NaiveDate::from_ymd_opt(2017, 2, 8).unwrap();
        let noon = local_noon(date).unwrap();
        assert_eq!(noon.date_naive(), date);
        assert_eq!(noon.format("%H:%M").to_string(), "12:00");
    }
}
