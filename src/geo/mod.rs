//! Geographic calculations for the automatic schedule.
//!
//! - [`solar`]: NOAA sunrise/sunset approximation returning fractional hours,
//!   with explicit polar day/night results instead of NaN.

pub mod solar;

pub use solar::{SolarEvents, coordinates_valid, sunrise_sunset};
