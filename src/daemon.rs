//! The long-running night-light daemon.
//!
//! One thread owns the [`NightLight`] engine and its [`TimerQueue`]. Signals
//! and config file changes arrive as [`DaemonMessage`]s on a channel; the loop
//! blocks on that channel until the next timer is due, so timers and messages
//! are always handled one at a time.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::common::constants::POLL_INTERVAL;
use crate::common::utils::{format_duration, private_path};
use crate::config::Config;
use crate::core::events::{NightLightState, Property};
use crate::core::scheduler::TimerQueue;
use crate::core::NightLight;
use crate::io::signals::{DaemonMessage, SignalState};
use crate::io::state_file::{self, StoredState};
use crate::time::{Clock, time_string_from_frac};

/// Engine plus the bookkeeping the daemon loop needs around it.
pub struct Daemon {
    engine: NightLight<TimerQueue>,
    config: Config,
    /// Where the state is published; `None` disables publishing
    state_path: Option<PathBuf>,
    last_published: Option<NightLightState>,
}

impl Daemon {
    /// Build the engine for `config`.
    ///
    /// `clock` drives the engine, `timer_clock` the timer queue. They are
    /// separate handles so tests can share one [`crate::time::ManualClock`].
    pub fn new(
        config: Config,
        clock: Box<dyn Clock>,
        timer_clock: Box<dyn Clock>,
        state_path: Option<PathBuf>,
    ) -> Self {
        let mut engine =
            NightLight::new(config.to_schedule_config(), clock, TimerQueue::with_clock(timer_clock));
        engine.set_smooth_enabled(config.smooth_enabled());
        engine.subscribe(log_change);

        Self {
            engine,
            config,
            state_path,
            last_published: None,
        }
    }

    pub fn engine(&self) -> &NightLight<TimerQueue> {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// First evaluation of the schedule.
    pub fn start(&mut self) {
        self.engine.start();
        self.publish_state();
    }

    /// Apply one message. Returns `false` when the daemon should exit.
    pub fn handle_message(&mut self, message: DaemonMessage) -> bool {
        match message {
            DaemonMessage::Reload => match Config::load() {
                Ok(config) => self.apply_config(config),
                Err(e) => {
                    log_pipe!();
                    log_error!("Failed to reload config: {e:#}");
                    log_indented!("Continuing with previous configuration");
                }
            },
            DaemonMessage::Preview => {
                let duration = self.config.preview_duration();
                log_block_start!(
                    "Previewing night temperature for {}",
                    format_duration(duration.as_secs())
                );
                self.engine.preview(duration);
            }
            DaemonMessage::TogglePause => {
                let paused = !self.engine.disabled_until_tomorrow();
                self.engine.set_disabled_until_tomorrow(paused);
            }
            DaemonMessage::Shutdown => return false,
        }

        self.publish_state();
        true
    }

    /// Swap in a new configuration, rechecking once.
    pub fn apply_config(&mut self, config: Config) {
        if config == self.config {
            log_debug!("Configuration unchanged");
            return;
        }

        config.log_config();
        self.engine.set_smooth_enabled(config.smooth_enabled());
        self.engine.set_config(config.to_schedule_config());
        self.config = config;
    }

    /// Fire every timer whose deadline has passed, rechecking first if the
    /// wall clock jumped.
    pub fn process_due_timers(&mut self) {
        self.engine.check_wall_clock();
        while let Some((_, timer)) = self.engine.scheduler_mut().pop_due() {
            self.engine.on_timer(timer);
        }
        self.publish_state();
    }

    /// How long the loop may block before a timer is due.
    pub fn wait_duration(&self) -> Duration {
        self.engine
            .scheduler()
            .time_until_next()
            .unwrap_or(POLL_INTERVAL)
    }

    /// Write the state file if anything observable changed since the last write.
    ///
    /// Temperature steps of a running ramp are not written; the file catches
    /// up once the ramp ends.
    fn publish_state(&mut self) {
        let snapshot = self.engine.snapshot();
        if let Some(last) = &self.last_published {
            if *last == snapshot {
                return;
            }
            let ramp_step = NightLightState {
                temperature: last.temperature,
                ..snapshot.clone()
            } == *last;
            if ramp_step && self.engine.smoothing() {
                return;
            }
        }

        if let Some(ref path) = self.state_path {
            let stored = StoredState {
                pid: std::process::id(),
                updated_at: self.engine.now(),
                state: snapshot.clone(),
            };
            if let Err(e) = state_file::write_state(path, &stored) {
                log_warning!("Failed to write state file {}: {e:#}", private_path(path));
            }
        }

        self.last_published = Some(snapshot);
    }

    /// Run until a shutdown message arrives or every sender is gone.
    pub fn run(mut self, signal_state: &SignalState) -> Result<()> {
        self.start();

        while signal_state.running.load(Ordering::SeqCst) {
            match signal_state.receiver.recv_timeout(self.wait_duration()) {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.process_due_timers();
        }

        self.engine.stop();
        if let Some(ref path) = self.state_path {
            state_file::remove_state(path);
        }
        Ok(())
    }
}

/// Observer that reports every change in the log.
fn log_change(property: Property, state: &NightLightState) {
    match property {
        Property::Active => {
            if state.active {
                log_block_start!("Night light active");
            } else {
                log_block_start!("Night light inactive");
            }
        }
        Property::Sunrise => log_decorated!("Sunrise: {}", time_string_from_frac(state.sunrise)),
        Property::Sunset => log_decorated!("Sunset: {}", time_string_from_frac(state.sunset)),
        Property::Temperature => log_debug!("Temperature: {:.0}K", state.temperature),
        Property::DisabledUntilTmw => {
            if state.disabled_until_tmw {
                log_block_start!("Paused until tomorrow");
            } else {
                log_block_start!("Resumed schedule");
            }
        }
        Property::Forced => {
            if state.forced {
                log_decorated!("Preview started");
            } else {
                log_decorated!("Preview finished");
            }
        }
    }
}
