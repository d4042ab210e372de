//! Implementation of the status command.
//!
//! Reads the state file published by the running daemon. With `--json` the
//! file contents are printed as a single JSON document and nothing else.

use anyhow::Result;

use crate::common::logger::Log;
use crate::io::instance;
use crate::io::state_file::{self, StoredState};
use crate::time::time_string_from_frac;

pub fn handle_status_command(json: bool) -> Result<()> {
    if json {
        Log::set_enabled(false);
    }

    let running = instance::get_running_instance()?;
    let stored = match running {
        Some(_) => state_file::read_state(&state_file::get_state_path())?,
        None => None,
    };

    if json {
        let output = match stored {
            Some(ref stored) => serde_json::to_string_pretty(stored)?,
            None => serde_json::to_string_pretty(&serde_json::json!({ "running": false }))?,
        };
        println!("{output}");
        return Ok(());
    }

    log_version!();
    match (running, stored) {
        (None, _) => {
            log_block_start!("nightlightd isn't running");
        }
        (Some(info), None) => {
            log_block_start!("nightlightd is running (PID: {})", info.pid);
            log_indented!("No state has been published yet");
        }
        (Some(_), Some(stored)) => display_state(&stored),
    }
    log_end!();
    Ok(())
}

fn display_state(stored: &StoredState) {
    let state = &stored.state;

    log_block_start!("nightlightd is running (PID: {})", stored.pid);
    log_indented!(
        "Night light: {}",
        if state.active { "active" } else { "inactive" }
    );
    log_indented!("Temperature: {:.0}K", state.temperature);
    log_indented!("Sunset: {}", time_string_from_frac(state.sunset));
    log_indented!("Sunrise: {}", time_string_from_frac(state.sunrise));
    if state.disabled_until_tmw {
        log_indented!("Paused until tomorrow");
    }
    if state.forced {
        log_indented!("Preview running");
    }
    log_indented!("Updated: {}", stored.updated_at.format("%Y-%m-%d %H:%M:%S"));
}
