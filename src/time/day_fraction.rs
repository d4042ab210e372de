//! Fractional-hour helpers.
//!
//! A time of day is represented as hours since local midnight, so 06:30 is
//! `6.5`. Intervals may wrap past midnight: `[20.0, 6.0)` covers the night.

use chrono::{DateTime, TimeZone, Timelike};

/// Hour of the day as a fraction, in the date-time's own UTC offset.
pub fn frac_day_from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0
}

/// Whether `value` falls into the possibly wrapping interval `[start, end)`.
///
/// An `end` at or before `start` is moved to the next day, so `start == end`
/// covers a full 24 hours and always returns `true`.
pub fn frac_day_is_between(value: f64, start: f64, end: f64) -> bool {
    let end = if end <= start { end + 24.0 } else { end };

    // Wrap value to the next day if it is before the range
    let value = if value < start && value < end {
        value + 24.0
    } else {
        value
    };

    value >= start && value < end
}

/// Hours from `start` forward to `value`, wrapping past midnight.
///
/// Both arguments may lie outside `[0, 24)`; the result never does.
pub fn frac_day_since(value: f64, start: f64) -> f64 {
    (value - start).rem_euclid(24.0)
}

/// Render a fractional hour as `HH:MM`. Negative values are unknown.
pub fn time_string_from_frac(fraction: f64) -> String {
    if !fraction.is_finite() || fraction < 0.0 {
        return "--:--".to_string();
    }
    let hours = fraction.trunc();
    let minutes = ((fraction - hours) * 60.0).trunc();
    format!("{:02}:{:02}", hours as u32 % 24, minutes as u32)
}
