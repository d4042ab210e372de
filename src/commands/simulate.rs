//! Implementation of the simulate command.
//!
//! Drives a [`NightLight`] engine with a [`ManualClock`] from a start to an
//! end time and prints every observable change, prefixed with the simulated
//! time. Nothing is locked, signalled or written, so this is safe to run next
//! to a live daemon.
//!
//! Times are given as `YYYY-MM-DD HH:MM[:SS]` in the local timezone, or in an
//! IANA timezone selected with `--tz`.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::common::logger::Log;
use crate::config::Config;
use crate::core::events::{NightLightState, Property};
use crate::core::scheduler::TimerQueue;
use crate::core::{NightLight, ScheduleConfig};
use crate::time::{Clock, ManualClock, time_string_from_frac};

/// Timezone the simulation is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationZone {
    Local,
    Named(Tz),
}

impl SimulationZone {
    /// `None` selects the local timezone.
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(SimulationZone::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(SimulationZone::Named)
                .map_err(|e| anyhow::anyhow!("Unknown time zone '{name}': {e}")),
        }
    }

    /// Civil time in this zone at the given instant.
    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            SimulationZone::Local => instant.with_timezone(&Local).fixed_offset(),
            SimulationZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    /// Interpret a wall-clock time in this zone.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant.
    pub fn resolve(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        let resolved = match self {
            SimulationZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            SimulationZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        };
        resolved.with_context(|| format!("{naive} does not exist in the selected time zone"))
    }
}

/// Parse `YYYY-MM-DD HH:MM` or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("Invalid time '{value}', expected \"YYYY-MM-DD HH:MM\""))
}

/// One observable change during a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedChange {
    pub at: DateTime<FixedOffset>,
    pub property: Property,
    pub state: NightLightState,
}

/// Step an engine from `start` to `end` and collect every change.
///
/// Smoothing is disabled so that each step lands on the scheduled value.
pub fn run_simulation(
    config: ScheduleConfig,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    step: Duration,
    zone: SimulationZone,
) -> Result<Vec<SimulatedChange>> {
    if end <= start {
        anyhow::bail!("End time must be after start time");
    }
    if step.is_zero() {
        anyhow::bail!("Step must be greater than zero");
    }

    let clock = ManualClock::new(start);
    let mut engine = NightLight::new(
        config,
        Box::new(clock.clone()),
        TimerQueue::with_clock(Box::new(clock.clone())),
    );
    engine.set_smooth_enabled(false);

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    let observer_clock = clock.clone();
    engine.subscribe(move |property, state| {
        sink.borrow_mut().push(SimulatedChange {
            at: observer_clock.now(),
            property,
            state: state.clone(),
        });
    });

    engine.start();

    while clock.now() < end {
        clock.advance(step);
        // Re-evaluate the offset, it changes across DST boundaries
        clock.set(zone.at(clock.now().with_timezone(&Utc)));

        while let Some((_, timer)) = engine.scheduler_mut().pop_due() {
            engine.on_timer(timer);
        }
        engine.recheck();
    }

    engine.stop();
    drop(engine);

    let collected = changes.borrow().clone();
    Ok(collected)
}

pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    step_minutes: u32,
    timezone: Option<&str>,
) -> Result<()> {
    log_version!();

    let zone = SimulationZone::parse(timezone)?;
    let start = zone.resolve(parse_time(start_time)?)?;
    let end = zone.resolve(parse_time(end_time)?)?;

    let config = Config::load()?;
    config.log_config();

    log_block_start!(
        "Simulating {} to {} in {} minute steps",
        start.format("%Y-%m-%d %H:%M %:z"),
        end.format("%Y-%m-%d %H:%M %:z"),
        step_minutes
    );

    let step = Duration::from_secs(u64::from(step_minutes) * 60);
    let changes = run_simulation(config.to_schedule_config(), start, end, step, zone)?;

    for change in &changes {
        Log::set_simulated_time(Some(change.at));
        log_decorated!("{}", describe_change(change));
    }
    Log::set_simulated_time(None);

    log_block_start!("Simulation complete, {} changes", changes.len());
    log_end!();
    Ok(())
}

fn describe_change(change: &SimulatedChange) -> String {
    let state = &change.state;
    match change.property {
        Property::Active => format!(
            "Night light {}",
            if state.active { "active" } else { "inactive" }
        ),
        Property::Sunrise => format!("Sunrise: {}", time_string_from_frac(state.sunrise)),
        Property::Sunset => format!("Sunset: {}", time_string_from_frac(state.sunset)),
        Property::Temperature => format!("Temperature: {:.0}K", state.temperature),
        Property::DisabledUntilTmw => format!("Disabled until tomorrow: {}", state.disabled_until_tmw),
        Property::Forced => format!("Forced: {}", state.forced),
    }
}
