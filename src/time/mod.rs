//! Time handling: injectable clocks and fractional-hour arithmetic.

pub mod day_fraction;
pub mod source;

pub use day_fraction::{
    frac_day_from_datetime, frac_day_is_between, frac_day_since, time_string_from_frac,
};
pub use source::{Clock, ManualClock, SystemClock};
