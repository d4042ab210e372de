//! NOAA sunrise and sunset calculation.
//!
//! Formulas follow the NOAA solar calculation spreadsheet
//! (<https://gml.noaa.gov/grad/solcalc/calcdetails.html>); the trailing
//! comments name the spreadsheet column each intermediate value corresponds
//! to. Results are fractional hours in the UTC offset of the input date-time,
//! so 6am is `6.0` and 4:30pm is `16.5`.
//!
//! Near the poles the hour-angle equation has no solution for part of the
//! year. Rather than letting `acos` produce NaN, the calculation reports
//! [`SolarEvents::PolarDay`] or [`SolarEvents::PolarNight`].

use anyhow::Result;
use chrono::{DateTime, Offset, TimeZone};
use std::f64::consts::PI;

use crate::common::constants::*;

/// Unix timestamp of 1900-01-01 00:00:00 UTC.
const EPOCH_1900_UNIX_SECONDS: i64 = -2_208_988_800;

const SECONDS_PER_DAY: i64 = 86_400;

/// Result of a sunrise/sunset calculation for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarEvents {
    /// The sun rises and sets; both values are fractional hours.
    Daily { sunrise: f64, sunset: f64 },
    /// The sun stays above the horizon all day.
    PolarDay,
    /// The sun stays below the horizon all day.
    PolarNight,
}

impl SolarEvents {
    /// Sunrise and sunset, if the sun crosses the horizon on this day.
    pub fn times(&self) -> Option<(f64, f64)> {
        match *self {
            SolarEvents::Daily { sunrise, sunset } => Some((sunrise, sunset)),
            SolarEvents::PolarDay | SolarEvents::PolarNight => None,
        }
    }
}

/// Whether the coordinates lie inside the valid latitude/longitude ranges.
pub fn coordinates_valid(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

fn deg2rad(degrees: f64) -> f64 {
    (PI * degrees) / 180.0
}

fn rad2deg(radians: f64) -> f64 {
    radians * (180.0 / PI)
}

/// Calculate sunrise and sunset for the day of `dt` at the given position.
///
/// The UTC offset of `dt` is taken as the local timezone; fractional offsets
/// such as +01:30 are supported. Fails when the latitude is outside
/// [-90, 90] or the longitude outside [-180, 180].
pub fn sunrise_sunset<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    latitude: f64,
    longitude: f64,
) -> Result<SolarEvents> {
    if !(-90.0..=90.0).contains(&latitude) {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {latitude})");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!("longitude must be between -180 and 180 degrees (got {longitude})");
    }

    let tz_offset = dt.offset().fix().local_minus_utc() as f64 / 3600.0; // B5
    // Whole days only, the time of day does not enter the calculation
    let days_since_1900 = (dt.timestamp() - EPOCH_1900_UNIX_SECONDS).div_euclid(SECONDS_PER_DAY);
    let date_as_number = days_since_1900 as f64 + 2.0; // B7
    let time_past_local_midnight = 0.0; // E2
    let julian_day =
        date_as_number + JULIAN_DATE_1900_OFFSET + time_past_local_midnight - tz_offset / 24.0;
    let julian_century = (julian_day - JULIAN_DATE_J2000) / DAYS_PER_JULIAN_CENTURY;

    let geom_mean_long_sun =
        (280.46646 + julian_century * (36000.76983 + julian_century * 0.0003032)) % 360.0; // I2
    let geom_mean_anom_sun =
        357.52911 + julian_century * (35999.05029 - 0.0001537 * julian_century); // J2
    let eccent_earth_orbit =
        0.016708634 - julian_century * (0.000042037 + 0.0000001267 * julian_century); // K2
    let sun_eq_of_ctr = deg2rad(geom_mean_anom_sun).sin()
        * (1.914602 - julian_century * (0.004817 + 0.000014 * julian_century))
        + deg2rad(2.0 * geom_mean_anom_sun).sin() * (0.019993 - 0.000101 * julian_century)
        + deg2rad(3.0 * geom_mean_anom_sun).sin() * 0.000289; // L2
    let sun_true_long = geom_mean_long_sun + sun_eq_of_ctr; // M2
    let sun_app_long =
        sun_true_long - 0.00569 - 0.00478 * deg2rad(125.04 - 1934.136 * julian_century).sin(); // P2
    let mean_obliq_ecliptic = 23.0
        + (26.0
            + (21.448
                - julian_century
                    * (46.815 + julian_century * (0.00059 - julian_century * 0.001813)))
                / 60.0)
            / 60.0; // Q2
    let obliq_corr =
        mean_obliq_ecliptic + 0.00256 * deg2rad(125.04 - 1934.136 * julian_century).cos(); // R2
    let sun_declin = rad2deg((deg2rad(obliq_corr).sin() * deg2rad(sun_app_long).sin()).asin()); // T2
    let var_y = deg2rad(obliq_corr / 2.0).tan() * deg2rad(obliq_corr / 2.0).tan(); // U2
    let eq_of_time = 4.0
        * rad2deg(
            var_y * (2.0 * deg2rad(geom_mean_long_sun)).sin()
                - 2.0 * eccent_earth_orbit * deg2rad(geom_mean_anom_sun).sin()
                + 4.0
                    * eccent_earth_orbit
                    * var_y
                    * deg2rad(geom_mean_anom_sun).sin()
                    * (2.0 * deg2rad(geom_mean_long_sun)).cos()
                - 0.5 * var_y * var_y * (4.0 * deg2rad(geom_mean_long_sun)).sin()
                - 1.25
                    * eccent_earth_orbit
                    * eccent_earth_orbit
                    * (2.0 * deg2rad(geom_mean_anom_sun)).sin(),
        ); // V2

    // acos() is only defined on [-1, 1]; outside of it the sun never crosses the horizon
    let cos_hour_angle = deg2rad(SUNRISE_ZENITH_DEGREES).cos()
        / (deg2rad(latitude).cos() * deg2rad(sun_declin).cos())
        - deg2rad(latitude).tan() * deg2rad(sun_declin).tan();
    if cos_hour_angle.is_nan() || cos_hour_angle > 1.0 {
        return Ok(SolarEvents::PolarNight);
    }
    if cos_hour_angle < -1.0 {
        return Ok(SolarEvents::PolarDay);
    }

    let ha_sunrise = rad2deg(cos_hour_angle.acos()); // W2
    let solar_noon = (720.0 - 4.0 * longitude - eq_of_time + tz_offset * 60.0) / 1440.0; // X2
    let sunrise_time = solar_noon - ha_sunrise * 4.0 / 1440.0; // Y2
    let sunset_time = solar_noon + ha_sunrise * 4.0 / 1440.0; // Z2

    Ok(SolarEvents::Daily {
        sunrise: sunrise_time * 24.0,
        sunset: sunset_time * 24.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn midnight(offset_secs: i32, y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_secs)
            .unwrap()
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_london_sunrise_sunset() {
        let events = sunrise_sunset(&midnight(0, 2007, 2, 1), 51.5, -0.1278).unwrap();
        let (sunrise, sunset) = events.times().expect("London has a sunrise in February");
        assert!((sunrise - 7.6).abs() < 0.1, "sunrise was {sunrise}");
        assert!((sunset - 16.8).abs() < 0.1, "sunset was {sunset}");
    }

    #[test]
    fn test_fractional_timezone_offset_shifts_result() {
        // UTC+01:30
        let events = sunrise_sunset(&midnight(5400, 2007, 2, 1), 51.5, -0.1278).unwrap();
        let (sunrise, sunset) = events.times().unwrap();
        assert!((sunrise - (7.6 + 1.5)).abs() < 0.1, "sunrise was {sunrise}");
        assert!((sunset - (16.8 + 1.5)).abs() < 0.1, "sunset was {sunset}");
    }

    #[test]
    fn test_time_of_day_does_not_change_result() {
        let start = midnight(0, 2017, 2, 8);
        let evening = start + chrono::Duration::hours(20);
        assert_eq!(
            sunrise_sunset(&start, 51.5, -0.1278).unwrap(),
            sunrise_sunset(&evening, 51.5, -0.1278).unwrap()
        );
    }

    #[test]
    fn test_coordinate_validation() {
        let dt = midnight(0, 2017, 2, 8);
        assert!(sunrise_sunset(&dt, 90.0, 180.0).is_ok());
        assert!(sunrise_sunset(&dt, -90.0, -180.0).is_ok());
        assert!(sunrise_sunset(&dt, 91.0, 0.0).is_err());
        assert!(sunrise_sunset(&dt, -91.0, 0.0).is_err());
        assert!(sunrise_sunset(&dt, 0.0, 181.0).is_err());
        assert!(sunrise_sunset(&dt, 0.0, -181.0).is_err());

        assert!(coordinates_valid(51.5, -0.1278));
        assert!(!coordinates_valid(91.0, 181.0));
    }

    #[test]
    fn test_polar_regions() {
        // Longyearbyen, Svalbard
        let winter = sunrise_sunset(&midnight(0, 2017, 12, 21), 78.22, 15.65).unwrap();
        assert_eq!(winter, SolarEvents::PolarNight);
        assert_eq!(winter.times(), None);

        let summer = sunrise_sunset(&midnight(0, 2017, 6, 21), 78.22, 15.65).unwrap();
        assert_eq!(summer, SolarEvents::PolarDay);
    }

    #[test]
    fn test_equator_day_length() {
        let events = sunrise_sunset(&midnight(0, 2017, 3, 20), 0.0, 0.0).unwrap();
        let (sunrise, sunset) = events.times().unwrap();
        let day_length = sunset - sunrise;
        assert!((day_length - 12.1).abs() < 0.2, "day length was {day_length}");
    }
}
