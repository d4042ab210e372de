//! Implementation of the run command: the foreground daemon.

use anyhow::{Context, Result};

use crate::common::utils::private_path;
use crate::config::{self, Config};
use crate::daemon::Daemon;
use crate::io::lock::{self, LockOutcome};
use crate::io::signals::setup_signal_handler;
use crate::io::state_file;
use crate::time::SystemClock;

/// Load the configuration, take the instance lock and run until shut down.
pub fn handle_run_command(debug_enabled: bool) -> Result<()> {
    log_version!();
    if debug_enabled {
        log_block_start!("Debug output enabled");
    }

    if let Some(custom_dir) = config::get_custom_config_dir() {
        log_block_start!("Base directory: {}", private_path(&custom_dir));
    }

    let config = Config::load().context("Configuration failed")?;
    config.log_config();

    let lock = match lock::acquire_lock()? {
        LockOutcome::Acquired(lock) => lock,
        LockOutcome::Held(info) => {
            log_pipe!();
            log_error!("nightlightd is already running (PID: {})", info.pid);
            log_block_start!("Did you mean to:");
            log_indented!("• Reload configuration: nightlightd reload");
            log_indented!("• Preview the night temperature: nightlightd preview");
            log_indented!("• Stop the running instance: nightlightd stop");
            anyhow::bail!("Cannot start - another nightlightd instance is running");
        }
    };
    log_debug!("Holding lock {}", private_path(lock.path()));

    let signal_state = setup_signal_handler()?;

    if let Err(e) = config::start_config_watcher(signal_state.sender.clone()) {
        log_pipe!();
        log_warning!("Hot reload unavailable: {e:#}");
    }

    let daemon = Daemon::new(
        config,
        Box::new(SystemClock),
        Box::new(SystemClock),
        Some(state_file::get_state_path()),
    );
    daemon.run(&signal_state)?;

    drop(lock);
    log_block_start!("Shut down cleanly");
    log_end!();
    Ok(())
}
