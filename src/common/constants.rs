//! Application-wide constants.
//!
//! Temperatures are in Kelvin, day fractions in fractional hours (6.5 = 06:30)
//! and timer intervals use `std::time::Duration`.

use std::time::Duration;

// # Color temperature

/// Lowest temperature the schedule will ever emit.
pub const TEMPERATURE_MIN: u32 = 1000;

/// Neutral white point, RGB [1.0, 1.0, 1.0]. Emitted whenever night light is off.
pub const TEMPERATURE_DEFAULT: u32 = 6500;

/// Highest temperature accepted from configuration.
pub const TEMPERATURE_MAX: u32 = 10000;

/// Temperature changes at or below this many Kelvin are not reported.
pub const TEMPERATURE_MAX_DELTA: f64 = 10.0;

// # Schedule

/// Day-fraction changes at or below one minute are not reported.
pub const FRAC_DAY_MAX_DELTA: f64 = 1.0 / 60.0;

/// Longest ramp (in hours) applied before the start and end of the night window.
pub const SCHEDULE_SMEAR_HOURS: f64 = 1.0;

/// Windows shorter than this (in hours) switch without a ramp.
pub const MINIMUM_SMEAR_HOURS: f64 = 0.01;

/// Interval between periodic schedule rechecks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Disagreement between wall-clock and monotonic time treated as a clock jump.
pub const WALL_CLOCK_MAX_DRIFT: Duration = Duration::from_secs(2);

// # Smoothing

/// Duration of a smooth temperature transition.
pub const SMOOTH_DURATION: Duration = Duration::from_secs(5);

/// Tick interval while a smooth transition is running.
pub const SMOOTH_TICK: Duration = Duration::from_millis(50);

// # Solar calculation

/// Zenith angle of the sun at sunrise/sunset, including refraction and the solar disc.
pub const SUNRISE_ZENITH_DEGREES: f64 = 90.833;

/// Julian date of spreadsheet serial day zero, the epoch used by the NOAA tables.
pub const JULIAN_DATE_1900_OFFSET: f64 = 2415018.5;

/// Julian date of the J2000.0 epoch.
pub const JULIAN_DATE_J2000: f64 = 2451545.0;

/// Days per Julian century.
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

// # Configuration defaults

pub const DEFAULT_ENABLED: bool = false;
pub const DEFAULT_SCHEDULE_AUTOMATIC: bool = true;
pub const DEFAULT_SCHEDULE_FROM: f64 = 20.0;
pub const DEFAULT_SCHEDULE_TO: f64 = 6.0;
pub const DEFAULT_TEMPERATURE: u32 = 2700;
pub const DEFAULT_SMOOTH: bool = true;
pub const DEFAULT_PREVIEW_DURATION: u64 = 5;

/// Coordinates used when none are configured. Deliberately out of range so
/// automatic scheduling falls back to the manual hours.
pub const COORDINATES_UNSET: (f64, f64) = (91.0, 181.0);

/// Longest preview the daemon accepts, in seconds.
pub const MAXIMUM_PREVIEW_DURATION: u64 = 120;

// # Files

pub const CONFIG_DIR_NAME: &str = "nightlightd";
pub const CONFIG_FILE_NAME: &str = "nightlightd.toml";
pub const STATE_FILE_NAME: &str = "state.json";
pub const LOCK_FILE_NAME: &str = "nightlightd.lock";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
