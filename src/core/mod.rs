//! The night-light schedule engine.
//!
//! [`NightLight`] decides whether night light is active and which color
//! temperature should be emitted right now. It is a plain state machine:
//!
//! - inputs are a [`ScheduleConfig`], a [`Clock`] (optionally overridden by a
//!   fixed date-time) and the two user overrides, "disabled until tomorrow"
//!   and "forced" (preview);
//! - outputs are the observable values `active`, `sunrise`, `sunset`,
//!   `temperature`, `disabled-until-tmw` and `forced`, each reported to the
//!   registered observers exactly once per actual change.
//!
//! Time only advances through timers the engine arms on its [`Scheduler`]:
//! a 60 second poll that rechecks the schedule, the 50ms smoothing tick and
//! the end of a preview. The owner of the scheduler feeds due timers back
//! through [`NightLight::on_timer`].
//!
//! ## Schedule window
//!
//! In automatic mode with valid coordinates the window runs from sunset to
//! sunrise; otherwise the manual `from`/`to` hours are used. Both bounds are
//! fractional hours and the window may wrap midnight. The temperature is
//! ramped linearly during the last `smear` hours before `from` and before
//! `to`, where `smear` is one hour shortened to fit the window:
//!
//! ```text
//!     from - smear   from                    to - smear   to
//!   6500 \____________________________________________/ 6500
//!          ramp down       target temperature    ramp up
//! ```

pub mod events;
pub mod scheduler;
pub mod smoothing;

use chrono::{DateTime, FixedOffset, Timelike};
use std::time::{Duration, Instant};

use crate::common::constants::*;
use crate::core::events::{NightLightState, Observer, Property};
use crate::core::scheduler::{Scheduler, Timer, TimerId, TimerQueue};
use crate::core::smoothing::{SmoothStep, TemperatureSmoother};
use crate::geo::{SolarEvents, coordinates_valid, sunrise_sunset};
use crate::time::{
    Clock, frac_day_from_datetime, frac_day_is_between, frac_day_since, time_string_from_frac,
};

/// Schedule settings the engine evaluates on every recheck.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    /// Use sunset/sunrise instead of the manual hours
    pub automatic: bool,
    /// Degrees north; out of range means "unknown"
    pub latitude: f64,
    /// Degrees east; out of range means "unknown"
    pub longitude: f64,
    /// Manual start of the night window, fractional hours
    pub manual_from: f64,
    /// Manual end of the night window, fractional hours
    pub manual_to: f64,
    /// Night temperature in Kelvin
    pub target_temperature: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            automatic: DEFAULT_SCHEDULE_AUTOMATIC,
            latitude: COORDINATES_UNSET.0,
            longitude: COORDINATES_UNSET.1,
            manual_from: DEFAULT_SCHEDULE_FROM,
            manual_to: DEFAULT_SCHEDULE_TO,
            target_temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// `(val1 - val2) * factor + val2`, so a factor of 1 yields `val1`.
fn linear_interpolate(val1: f64, val2: f64, factor: f64) -> f64 {
    debug_assert!(
        (0.0..=1.0).contains(&factor),
        "interpolation factor {factor} outside [0, 1]"
    );
    (val1 - val2) * factor + val2
}

/// Night-light state machine.
pub struct NightLight<S: Scheduler = TimerQueue> {
    config: ScheduleConfig,
    clock: Box<dyn Clock>,
    datetime_override: Option<DateTime<FixedOffset>>,
    scheduler: S,
    smoother: TemperatureSmoother,

    cached_sunrise: f64,
    cached_sunset: f64,
    cached_active: bool,
    cached_temperature: f64,
    forced: bool,
    // Some(time the override was set) while disabled until tomorrow
    disabled_since: Option<DateTime<FixedOffset>>,

    poll_timer: Option<TimerId>,
    // Wall and monotonic time when the poll was armed
    poll_reference: Option<(DateTime<FixedOffset>, Instant)>,
    preview_timer: Option<TimerId>,
    observers: Vec<Observer>,
}

impl<S: Scheduler> NightLight<S> {
    /// Create an engine in its initial state: inactive, sunrise and sunset
    /// unknown, temperature 6500K, smoothing enabled.
    ///
    /// Nothing is evaluated until [`start`](Self::start) or one of the
    /// setters is called.
    pub fn new(config: ScheduleConfig, clock: Box<dyn Clock>, scheduler: S) -> Self {
        Self {
            config,
            clock,
            datetime_override: None,
            scheduler,
            smoother: TemperatureSmoother::new(DEFAULT_SMOOTH),
            cached_sunrise: -1.0,
            cached_sunset: -1.0,
            cached_active: false,
            cached_temperature: TEMPERATURE_DEFAULT as f64,
            forced: false,
            disabled_since: None,
            poll_timer: None,
            poll_reference: None,
            preview_timer: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer for all observable changes.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(Property, &NightLightState) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn active(&self) -> bool {
        self.cached_active
    }

    /// Sunrise as fractional hours, `-1.0` until first calculated.
    pub fn sunrise(&self) -> f64 {
        self.cached_sunrise
    }

    /// Sunset as fractional hours, `-1.0` until first calculated.
    pub fn sunset(&self) -> f64 {
        self.cached_sunset
    }

    /// Currently emitted temperature in Kelvin.
    pub fn temperature(&self) -> f64 {
        self.cached_temperature
    }

    pub fn disabled_until_tomorrow(&self) -> bool {
        self.disabled_since.is_some()
    }

    pub fn forced(&self) -> bool {
        self.forced
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn smooth_enabled(&self) -> bool {
        self.smoother.is_enabled()
    }

    /// Whether a smooth transition is in flight.
    pub fn smoothing(&self) -> bool {
        self.smoother.is_ramping()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Current date-time as seen by the schedule.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.datetime_override.unwrap_or_else(|| self.clock.now())
    }

    /// All observable values at once.
    pub fn snapshot(&self) -> NightLightState {
        NightLightState {
            active: self.cached_active,
            sunrise: self.cached_sunrise,
            sunset: self.cached_sunset,
            temperature: self.cached_temperature,
            disabled_until_tmw: self.disabled_until_tomorrow(),
            forced: self.forced,
        }
    }

    /// Evaluate the schedule and arm the poll timer.
    pub fn start(&mut self) {
        self.recheck();
        self.arm_poll();
    }

    /// Cancel every pending timer. Observable values are left as they are.
    pub fn stop(&mut self) {
        for id in [
            self.poll_timer.take(),
            self.preview_timer.take(),
            self.smoother.cancel(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(id);
        }
        self.poll_reference = None;
    }

    /// Recheck right away if the wall clock jumped since the poll was armed,
    /// e.g. after a suspend or a manual time change.
    ///
    /// Returns whether a jump was detected. Does nothing before
    /// [`start`](Self::start) or after [`stop`](Self::stop).
    pub fn check_wall_clock(&mut self) -> bool {
        let Some((wall, instant)) = self.poll_reference else {
            return false;
        };
        let elapsed = self.clock.instant().saturating_duration_since(instant);
        let Ok(elapsed) = chrono::Duration::from_std(elapsed) else {
            return false;
        };

        let drift = self.clock.now().signed_duration_since(wall + elapsed);
        if drift.num_milliseconds().unsigned_abs() <= WALL_CLOCK_MAX_DRIFT.as_millis() as u64 {
            return false;
        }

        log_debug!("Wall clock jumped by {}s, rechecking", drift.num_seconds());
        if let Some(id) = self.poll_timer.take() {
            self.scheduler.cancel(id);
        }
        self.recheck();
        self.arm_poll();
        true
    }

    /// Replace the whole configuration and recheck.
    pub fn set_config(&mut self, config: ScheduleConfig) {
        self.config = config;
        self.recheck();
    }

    /// Change part of the configuration and recheck.
    pub fn update_config<F: FnOnce(&mut ScheduleConfig)>(&mut self, update: F) {
        update(&mut self.config);
        self.recheck();
    }

    /// Use a fixed date-time instead of the clock, or go back to the clock
    /// with `None`. Rechecks immediately.
    pub fn set_date_time_override(&mut self, datetime: Option<DateTime<FixedOffset>>) {
        self.datetime_override = datetime;
        self.recheck();
    }

    pub fn set_smooth_enabled(&mut self, enabled: bool) {
        if let Some(id) = self.smoother.set_enabled(enabled) {
            self.scheduler.cancel(id);
        }
    }

    /// Suspend night light until the next end of the night window.
    ///
    /// The override clears itself once the window end (sunrise in automatic
    /// mode) has passed since it was set, or after 24 hours at the latest.
    pub fn set_disabled_until_tomorrow(&mut self, value: bool) {
        if self.disabled_until_tomorrow() == value {
            return;
        }

        let now = self.now();
        self.disabled_since = value.then_some(now);
        self.recheck();
        self.notify(Property::DisabledUntilTmw);
    }

    /// Force the night temperature regardless of the schedule.
    pub fn set_forced(&mut self, value: bool) {
        if self.forced == value {
            return;
        }

        self.forced = value;
        self.notify(Property::Forced);

        // A recheck while disabled would leave the forced temperature behind
        if !self.forced && !self.cached_active {
            self.set_temperature(TEMPERATURE_DEFAULT as f64);
        }

        self.recheck();
    }

    /// Force night light on for `duration`, then return to the schedule.
    ///
    /// Starting a new preview replaces the end time of a running one.
    pub fn preview(&mut self, duration: Duration) {
        if let Some(id) = self.preview_timer.take() {
            self.scheduler.cancel(id);
        }
        self.set_forced(true);
        self.preview_timer = Some(self.scheduler.schedule_once(duration, Timer::PreviewEnd));
    }

    /// Handle a timer armed by this engine that has become due.
    pub fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Poll => {
                self.poll_timer = None;
                self.recheck();
                self.arm_poll();
            }
            Timer::Smooth => self.smooth_tick(),
            Timer::PreviewEnd => {
                self.preview_timer = None;
                self.set_forced(false);
            }
        }
    }

    /// Re-evaluate the schedule against the current time.
    pub fn recheck(&mut self) {
        // Forced mode only sets the night temperature, a proper recheck
        // happens once it is switched off again
        if self.forced {
            self.set_temperature(self.config.target_temperature as f64);
            return;
        }

        if !self.config.enabled {
            log_debug!("Night light disabled, resetting");
            self.set_active(false);
            return;
        }

        let now = self.now();

        let solar = if self.config.automatic {
            self.solar_window(&now)
        } else {
            None
        };
        let (schedule_from, schedule_to) = match solar {
            Some((from, to)) if from > 0.0 && to > 0.0 => (from, to),
            _ => (self.config.manual_from, self.config.manual_to),
        };

        let frac_day = frac_day_from_datetime(&now);
        log_debug!(
            "Fractional day = {frac_day:.3}, limits = {schedule_from:.3}->{schedule_to:.3}"
        );

        if let Some(since) = self.disabled_since {
            let elapsed = now.signed_duration_since(since);
            let mut reset = false;

            if elapsed > chrono::Duration::hours(24) {
                log_debug!("Disabled until tomorrow is older than 24h, resetting");
                reset = true;
            } else if elapsed > chrono::Duration::zero() {
                // Or the end of the window passed since it was disabled
                let frac_disabled = frac_day_from_datetime(&since);
                if frac_disabled != frac_day
                    && frac_day_is_between(schedule_to, frac_disabled, frac_day)
                {
                    log_debug!("End of night window passed, resetting disabled until tomorrow");
                    reset = true;
                }
            }

            if reset {
                self.disabled_since = None;
                self.notify(Property::DisabledUntilTmw);
            } else {
                log_debug!("Still disabled until tomorrow");
                self.set_temperature(TEMPERATURE_DEFAULT as f64);
                return;
            }
        }

        // Shorten the smearing period to fit between start and stop
        let span = frac_day_since(schedule_to, schedule_from);
        let smear = SCHEDULE_SMEAR_HOURS.min(span.min(24.0 - span));

        // Solar bounds may lie past midnight, so ramps are measured on the wrapped day
        let ramp_down_start = (schedule_from - smear).rem_euclid(24.0);
        let ramp_up_start = (schedule_to - smear).rem_euclid(24.0);

        if !frac_day_is_between(frac_day, ramp_down_start, schedule_to) {
            log_debug!("Not time for night light");
            self.set_active(false);
            return;
        }

        let temperature = self.config.target_temperature;
        let temp_smeared = if smear < MINIMUM_SMEAR_HOURS {
            temperature
        } else if frac_day_is_between(frac_day, ramp_down_start, schedule_from) {
            let factor = (1.0 - frac_day_since(frac_day, ramp_down_start) / smear).clamp(0.0, 1.0);
            linear_interpolate(TEMPERATURE_DEFAULT as f64, temperature as f64, factor) as u32
        } else if frac_day_is_between(frac_day, ramp_up_start, schedule_to) {
            let factor = (frac_day_since(frac_day, ramp_up_start) / smear).clamp(0.0, 1.0);
            linear_interpolate(TEMPERATURE_DEFAULT as f64, temperature as f64, factor) as u32
        } else {
            temperature
        };
        log_debug!("Night light on, using {temp_smeared}K (aiming for {temperature}K)");

        self.set_active(true);
        self.set_temperature(temp_smeared as f64);
    }

    /// Sunset/sunrise window for today, refreshing the cached values.
    ///
    /// `None` when the coordinates are unknown or the sun does not cross the
    /// horizon today.
    fn solar_window(&mut self, now: &DateTime<FixedOffset>) -> Option<(f64, f64)> {
        let (latitude, longitude) = (self.config.latitude, self.config.longitude);
        if !coordinates_valid(latitude, longitude) {
            log_debug!("No valid coordinates, using manual schedule");
            return None;
        }

        match sunrise_sunset(now, latitude, longitude) {
            Ok(SolarEvents::Daily { sunrise, sunset }) => {
                self.update_cached_sunrise_sunset(sunrise, sunset);
            }
            Ok(events) => {
                log_debug!("{events:?} at {latitude:.3},{longitude:.3}, using manual schedule");
                return None;
            }
            Err(e) => {
                log_warning!("Failed to get sunrise/sunset for {latitude:.3},{longitude:.3}: {e}");
                return None;
            }
        }

        (self.cached_sunrise > 0.0 && self.cached_sunset > 0.0)
            .then_some((self.cached_sunset, self.cached_sunrise))
    }

    fn update_cached_sunrise_sunset(&mut self, sunrise: f64, sunset: f64) {
        if (self.cached_sunrise - sunrise).abs() > FRAC_DAY_MAX_DELTA {
            log_debug!("Sunrise now at {}", time_string_from_frac(sunrise));
            self.cached_sunrise = sunrise;
            self.notify(Property::Sunrise);
        }
        if (self.cached_sunset - sunset).abs() > FRAC_DAY_MAX_DELTA {
            log_debug!("Sunset now at {}", time_string_from_frac(sunset));
            self.cached_sunset = sunset;
            self.notify(Property::Sunset);
        }
    }

    fn set_active(&mut self, active: bool) {
        if self.cached_active == active {
            return;
        }
        self.cached_active = active;

        if !active {
            self.set_temperature(TEMPERATURE_DEFAULT as f64);
        }

        self.notify(Property::Active);
    }

    /// Move the emitted temperature toward `temperature`, smoothing if enabled.
    fn set_temperature(&mut self, temperature: f64) {
        if !self.smoother.is_enabled() {
            self.set_temperature_internal(temperature);
            return;
        }

        // Any ramp in flight is superseded
        if let Some(id) = self.smoother.cancel() {
            self.scheduler.cancel(id);
        }

        if (temperature - self.cached_temperature).abs() < TEMPERATURE_MAX_DELTA {
            self.set_temperature_internal(temperature);
            return;
        }

        let timer = self.scheduler.schedule_once(SMOOTH_TICK, Timer::Smooth);
        self.smoother.begin(temperature, self.clock.instant(), timer);
    }

    fn set_temperature_internal(&mut self, temperature: f64) {
        if (self.cached_temperature - temperature).abs() <= TEMPERATURE_MAX_DELTA {
            return;
        }
        self.cached_temperature = temperature;
        self.notify(Property::Temperature);
    }

    fn smooth_tick(&mut self) {
        let now = self.clock.instant();
        match self.smoother.tick(self.cached_temperature, now) {
            SmoothStep::Idle => {}
            SmoothStep::Continue(temperature) => {
                self.set_temperature_internal(temperature);
                let timer = self.scheduler.schedule_once(SMOOTH_TICK, Timer::Smooth);
                self.smoother.rearm(timer);
            }
            SmoothStep::Finished(target) => self.set_temperature_internal(target),
        }
    }

    /// Arm the next poll on the following wall-clock minute.
    fn arm_poll(&mut self) {
        if self.poll_timer.is_some() {
            return;
        }
        let now = self.clock.now();
        let into_minute = Duration::new(now.second() as u64, now.nanosecond() % 1_000_000_000);
        let delay = POLL_INTERVAL.saturating_sub(into_minute);

        self.poll_reference = Some((now, self.clock.instant()));
        self.poll_timer = Some(self.scheduler.schedule_once(delay, Timer::Poll));
    }

    fn notify(&mut self, property: Property) {
        if self.observers.is_empty() {
            return;
        }
        let state = self.snapshot();
        for observer in self.observers.iter_mut() {
            observer(property, &state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::MockScheduler;
    use crate::time::ManualClock;
    use chrono::TimeZone;
    use mockall::predicate::eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    fn manual_config(from: f64, to: f64) -> ScheduleConfig {
        ScheduleConfig {
            enabled: true,
            automatic: false,
            manual_from: from,
            manual_to: to,
            target_temperature: 4000,
            ..ScheduleConfig::default()
        }
    }

    fn engine(config: ScheduleConfig, now: DateTime<FixedOffset>) -> NightLight<TimerQueue> {
        let clock = ManualClock::new(now);
        let queue = TimerQueue::with_clock(Box::new(clock.clone()));
        let mut engine = NightLight::new(config, Box::new(clock), queue);
        engine.set_smooth_enabled(false);
        engine
    }

    fn counter<S: Scheduler>(engine: &mut NightLight<S>) -> Rc<RefCell<HashMap<Property, u32>>> {
        let counts = Rc::new(RefCell::new(HashMap::new()));
        let sink = Rc::clone(&counts);
        engine.subscribe(move |property, _| {
            *sink.borrow_mut().entry(property).or_insert(0) += 1;
        });
        counts
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(ScheduleConfig::default(), utc(2017, 2, 8, 20, 0));
        assert!(!engine.active());
        assert_eq!(engine.sunrise(), -1.0);
        assert_eq!(engine.sunset(), -1.0);
        assert_eq!(engine.temperature(), 6500.0);
        assert!(!engine.disabled_until_tomorrow());
        assert!(!engine.forced());
    }

    #[test]
    fn test_getters_report_their_own_values() {
        let mut engine = engine(
            ScheduleConfig {
                enabled: true,
                automatic: true,
                latitude: 51.5,
                longitude: -0.1278,
                target_temperature: 4000,
                ..ScheduleConfig::default()
            },
            utc(2017, 2, 8, 20, 0),
        );
        engine.start();

        assert!(engine.sunrise() > 7.0 && engine.sunrise() < 8.0);
        assert!(engine.sunset() > 16.75 && engine.sunset() < 17.25);
        assert_eq!(engine.temperature(), 4000.0);
    }

    #[test]
    fn test_manual_window_with_smearing() {
        let mut engine = engine(manual_config(20.0, 6.0), utc(2017, 2, 8, 12, 0));
        engine.start();
        assert!(!engine.active());

        // Halfway through the ramp down before 20:00
        engine.set_date_time_override(Some(utc(2017, 2, 8, 19, 30)));
        assert!(engine.active());
        assert_eq!(engine.temperature(), 5250.0);

        engine.set_date_time_override(Some(utc(2017, 2, 8, 23, 0)));
        assert_eq!(engine.temperature(), 4000.0);

        // A quarter into the ramp up before 06:00
        engine.set_date_time_override(Some(utc(2017, 2, 9, 5, 15)));
        assert!(engine.active());
        assert_eq!(engine.temperature(), 4625.0);

        engine.set_date_time_override(Some(utc(2017, 2, 9, 6, 0)));
        assert!(!engine.active());
        assert_eq!(engine.temperature(), 6500.0);
    }

    #[test]
    fn test_ramp_down_across_midnight() {
        let mut engine = engine(manual_config(0.5, 6.0), utc(2017, 2, 8, 23, 45));
        engine.start();
        assert!(engine.active());
        assert_eq!(engine.temperature(), 5875.0);

        engine.set_date_time_override(Some(utc(2017, 2, 9, 0, 15)));
        assert!(engine.active());
        assert_eq!(engine.temperature(), 4625.0);

        engine.set_date_time_override(Some(utc(2017, 2, 8, 23, 15)));
        assert!(!engine.active());
    }

    #[test]
    fn test_sunset_after_midnight_smears_into_next_day() {
        // Reykjavik at midsummer: sunset falls just past midnight UTC
        let mut engine = engine(
            ScheduleConfig {
                enabled: true,
                automatic: true,
                latitude: 64.13,
                longitude: -21.94,
                manual_from: 20.0,
                manual_to: 6.0,
                target_temperature: 4000,
            },
            utc(2017, 6, 21, 0, 1),
        );
        engine.start();

        assert!(engine.sunset() > 24.0, "sunset {}", engine.sunset());
        assert!((2.0..4.0).contains(&engine.sunrise()), "sunrise {}", engine.sunrise());
        assert!(engine.active());
        // Almost at the end of the ramp down
        let temperature = engine.temperature();
        assert!((4050.0..4150.0).contains(&temperature), "temperature {temperature}");
    }

    #[test]
    fn test_recheck_is_idempotent() {
        let mut engine = engine(manual_config(20.0, 6.0), utc(2017, 2, 8, 22, 0));
        let counts = counter(&mut engine);
        engine.start();
        let after_start = counts.borrow().clone();
        assert_eq!(after_start.get(&Property::Active), Some(&1));
        assert_eq!(after_start.get(&Property::Temperature), Some(&1));

        engine.recheck();
        engine.recheck();
        engine.set_config(engine.config().clone());
        assert_eq!(*counts.borrow(), after_start);
    }

    #[test]
    fn test_polar_night_falls_back_to_manual() {
        let mut engine = engine(
            ScheduleConfig {
                enabled: true,
                automatic: true,
                latitude: 78.22,
                longitude: 15.65,
                manual_from: 20.0,
                manual_to: 6.0,
                target_temperature: 4000,
            },
            utc(2017, 12, 21, 12, 0),
        );
        engine.start();

        assert_eq!(engine.sunrise(), -1.0);
        assert_eq!(engine.sunset(), -1.0);
        assert!(!engine.active());

        engine.set_date_time_override(Some(utc(2017, 12, 21, 22, 0)));
        assert!(engine.active());
        assert_eq!(engine.temperature(), 4000.0);
    }

    #[test]
    fn test_invalid_coordinates_fall_back_to_manual() {
        let mut engine = engine(
            ScheduleConfig {
                automatic: true,
                ..manual_config(20.0, 6.0)
            },
            utc(2017, 2, 8, 22, 0),
        );
        engine.start();
        assert!(engine.active());
        assert_eq!(engine.sunrise(), -1.0);
    }

    #[test]
    fn test_forced_uses_target_temperature() {
        let mut engine = engine(manual_config(20.0, 6.0), utc(2017, 2, 8, 12, 0));
        let counts = counter(&mut engine);
        engine.start();

        engine.set_forced(true);
        engine.set_forced(true);
        assert!(engine.forced());
        assert!(!engine.active());
        assert_eq!(engine.temperature(), 4000.0);
        assert_eq!(counts.borrow().get(&Property::Forced), Some(&1));

        engine.set_forced(false);
        assert_eq!(engine.temperature(), 6500.0);
        assert_eq!(counts.borrow().get(&Property::Forced), Some(&2));
    }

    #[test]
    fn test_preview_ends_after_duration() {
        let clock = ManualClock::new(utc(2017, 2, 8, 12, 0));
        let queue = TimerQueue::with_clock(Box::new(clock.clone()));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock.clone()), queue);
        engine.set_smooth_enabled(false);
        engine.start();

        engine.preview(Duration::from_secs(5));
        assert!(engine.forced());
        assert_eq!(engine.temperature(), 4000.0);

        clock.advance(Duration::from_secs(5));
        while let Some((_, timer)) = engine.scheduler_mut().pop_due() {
            engine.on_timer(timer);
        }
        assert!(!engine.forced());
        assert_eq!(engine.temperature(), 6500.0);
    }

    #[test]
    fn test_smoothing_ramps_to_target() {
        let clock = ManualClock::new(utc(2017, 2, 8, 22, 0));
        let queue = TimerQueue::with_clock(Box::new(clock.clone()));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock.clone()), queue);
        let counts = counter(&mut engine);
        engine.start();

        assert!(engine.active());
        assert_eq!(engine.temperature(), 6500.0);

        let mut last = engine.temperature();
        for _ in 0..120 {
            clock.advance(SMOOTH_TICK);
            while let Some((_, timer)) = engine.scheduler_mut().pop_due() {
                engine.on_timer(timer);
            }
            assert!(engine.temperature() <= last);
            last = engine.temperature();
        }

        // The final snap is skipped when already within the change tolerance
        assert!((engine.temperature() - 4000.0).abs() <= TEMPERATURE_MAX_DELTA);
        assert!(!engine.scheduler().contains(Timer::Smooth));
        assert!(counts.borrow()[&Property::Temperature] > 1);
    }

    #[test]
    fn test_smoothing_arms_tick_timer() {
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_schedule_once()
            .with(eq(SMOOTH_TICK), eq(Timer::Smooth))
            .times(1)
            .returning(|_, _| TimerId(1));
        scheduler
            .expect_schedule_once()
            .with(eq(POLL_INTERVAL), eq(Timer::Poll))
            .times(1)
            .returning(|_, _| TimerId(2));

        let clock = ManualClock::new(utc(2017, 2, 8, 22, 0));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock), scheduler);
        engine.start();

        assert!(engine.active());
        assert_eq!(engine.temperature(), 6500.0);
    }

    #[test]
    fn test_disabling_smoothing_cancels_tick() {
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_schedule_once()
            .with(eq(SMOOTH_TICK), eq(Timer::Smooth))
            .returning(|_, _| TimerId(7));
        scheduler
            .expect_cancel()
            .with(eq(TimerId(7)))
            .times(1)
            .return_const(());

        let clock = ManualClock::new(utc(2017, 2, 8, 22, 0));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock), scheduler);
        engine.recheck();
        engine.set_smooth_enabled(false);

        assert!(!engine.smooth_enabled());
        assert_eq!(engine.temperature(), 6500.0);
    }

    #[test]
    fn test_poll_timer_rearms() {
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_schedule_once()
            .with(eq(POLL_INTERVAL), eq(Timer::Poll))
            .times(2)
            .returning(|_, _| TimerId(1));

        let clock = ManualClock::new(utc(2017, 2, 8, 12, 0));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock), scheduler);
        engine.start();
        engine.on_timer(Timer::Poll);
    }

    #[test]
    fn test_poll_lands_on_next_minute() {
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_schedule_once()
            .with(eq(Duration::from_secs(30)), eq(Timer::Poll))
            .times(1)
            .returning(|_, _| TimerId(1));

        let clock = ManualClock::new(utc(2017, 2, 8, 12, 0) + chrono::Duration::seconds(30));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock), scheduler);
        engine.start();
    }

    #[test]
    fn test_wall_clock_jump_rechecks() {
        let clock = ManualClock::new(utc(2017, 2, 8, 12, 0));
        let queue = TimerQueue::with_clock(Box::new(clock.clone()));
        let mut engine = NightLight::new(manual_config(20.0, 6.0), Box::new(clock.clone()), queue);
        engine.set_smooth_enabled(false);
        engine.start();
        assert!(!engine.active());

        // Steady time is not a jump
        clock.advance(Duration::from_secs(20));
        assert!(!engine.check_wall_clock());

        clock.set(utc(2017, 2, 8, 22, 0) + chrono::Duration::seconds(20));
        assert!(engine.check_wall_clock());
        assert!(engine.active());
        assert_eq!(engine.temperature(), 4000.0);
        assert_eq!(engine.scheduler().len(), 1);
        assert_eq!(
            engine.scheduler().time_until_next(),
            Some(Duration::from_secs(40))
        );

        // The new reference absorbs the jump
        assert!(!engine.check_wall_clock());

        engine.stop();
        clock.set(utc(2017, 2, 8, 12, 0));
        assert!(!engine.check_wall_clock());
        assert!(engine.active());
    }

    #[test]
    fn test_linear_interpolate() {
        assert_eq!(linear_interpolate(6500.0, 4000.0, 1.0), 6500.0);
        assert_eq!(linear_interpolate(6500.0, 4000.0, 0.0), 4000.0);
        assert_eq!(linear_interpolate(6500.0, 4000.0, 0.5), 5250.0);
    }
}
