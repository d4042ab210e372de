//! Time-based temperature smoothing.
//!
//! When smoothing is enabled, a change of the emitted temperature is not
//! applied in one step. Instead a ramp is started toward the new target and a
//! 50ms tick moves the current value a fraction of the remaining distance
//! on every call, where the fraction is the elapsed share of the 5 second
//! smoothing window. Once the window has elapsed the value snaps to the
//! target.
//!
//! The smoother itself only tracks the ramp; arming the tick timer and
//! applying the stepped value is done by the engine.

use std::time::{Duration, Instant};

use crate::common::constants::*;
use crate::core::scheduler::TimerId;

/// Outcome of one smoothing tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothStep {
    /// No ramp in flight.
    Idle,
    /// Apply the value and tick again.
    Continue(f64),
    /// Apply the target, the ramp is done.
    Finished(f64),
}

#[derive(Debug, Clone, Copy)]
struct Ramp {
    target: f64,
    started: Instant,
    timer: TimerId,
}

/// Ramp state toward a target temperature.
#[derive(Debug)]
pub struct TemperatureSmoother {
    enabled: bool,
    duration: Duration,
    ramp: Option<Ramp>,
}

impl TemperatureSmoother {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            duration: SMOOTH_DURATION,
            ramp: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch smoothing on or off.
    ///
    /// Disabling drops any ramp in flight and returns its tick timer so the
    /// caller can cancel it.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<TimerId> {
        self.enabled = enabled;
        if enabled { None } else { self.cancel() }
    }

    /// Target of the ramp in flight.
    pub fn target(&self) -> Option<f64> {
        self.ramp.map(|ramp| ramp.target)
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    /// Start a ramp toward `target` whose first tick is `timer`.
    pub fn begin(&mut self, target: f64, started: Instant, timer: TimerId) {
        debug_assert!(self.ramp.is_none(), "ramp already in flight");
        self.ramp = Some(Ramp {
            target,
            started,
            timer,
        });
    }

    /// Drop the ramp in flight, returning its pending tick timer.
    ///
    /// The emitted temperature stays wherever the last tick left it.
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.ramp.take().map(|ramp| ramp.timer)
    }

    /// Record the timer armed for the next tick.
    pub fn rearm(&mut self, timer: TimerId) {
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.timer = timer;
        }
    }

    /// Advance the ramp from `current` at monotonic time `now`.
    pub fn tick(&mut self, current: f64, now: Instant) -> SmoothStep {
        let Some(ramp) = self.ramp else {
            return SmoothStep::Idle;
        };

        let elapsed = now.saturating_duration_since(ramp.started);
        let frac = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        if frac >= 1.0 {
            self.ramp = None;
            return SmoothStep::Finished(ramp.target);
        }

        SmoothStep::Continue(current + (ramp.target - current) * frac)
    }
}
