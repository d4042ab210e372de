//! Change notification for the night-light engine.
//!
//! Every observable value of the engine is identified by a [`Property`].
//! Whenever one of them actually changes, each registered observer is called
//! once with the property and a [`NightLightState`] snapshot taken right after
//! the change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable values of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Property {
    Active,
    Sunrise,
    Sunset,
    Temperature,
    DisabledUntilTmw,
    Forced,
}

impl Property {
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Active => "active",
            Property::Sunrise => "sunrise",
            Property::Sunset => "sunset",
            Property::Temperature => "temperature",
            Property::DisabledUntilTmw => "disabled-until-tmw",
            Property::Forced => "forced",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable snapshot of everything the engine exposes.
///
/// This is what the daemon writes to its state file and what `status --json`
/// prints. Sunrise and sunset are fractional hours, `-1.0` while unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightLightState {
    pub active: bool,
    pub sunrise: f64,
    pub sunset: f64,
    /// Currently emitted temperature in Kelvin
    pub temperature: f64,
    pub disabled_until_tmw: bool,
    pub forced: bool,
}

/// Callback invoked on every observable change.
pub type Observer = Box<dyn FnMut(Property, &NightLightState)>;
