//! Commands that signal the running daemon: reload, preview, pause and stop.

use anyhow::{Context, Result};
use nix::sys::signal::Signal;
use std::time::Duration;

use crate::io::instance;

/// How long `stop` waits for the daemon to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Requests a client can send to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Reload,
    Preview,
    Pause,
}

impl ControlCommand {
    /// Signal understood by the daemon for this request.
    pub fn signal(self) -> Signal {
        match self {
            ControlCommand::Reload => Signal::SIGHUP,
            ControlCommand::Preview => Signal::SIGUSR1,
            ControlCommand::Pause => Signal::SIGUSR2,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ControlCommand::Reload => "Configuration reload requested",
            ControlCommand::Preview => "Preview requested",
            ControlCommand::Pause => "Pause toggled",
        }
    }
}

/// Send `command` to the running daemon.
pub fn handle_control_command(command: ControlCommand) -> Result<()> {
    log_version!();

    let pid = instance::get_running_instance_pid().context("nightlightd isn't running")?;
    instance::send_signal(pid, command.signal())?;

    log_block_start!("{} (PID: {pid})", command.description());
    log_end!();
    Ok(())
}

/// Terminate the running daemon and wait for it to exit.
pub fn handle_stop_command() -> Result<()> {
    log_version!();

    let pid = instance::get_running_instance_pid().context("nightlightd isn't running")?;
    log_block_start!("Stopping nightlightd instance (PID: {pid})...");

    if instance::terminate_and_wait(pid, STOP_TIMEOUT)? {
        log_pipe!();
        log_info!("Process terminated successfully");
    } else {
        log_pipe!();
        log_warning!("Process did not terminate within the expected time");
        log_indented!(
            "The termination signal was sent, but the process may still be shutting down"
        );
    }
    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::signals::{DaemonMessage, message_for_signal};

    #[test]
    fn test_commands_match_daemon_signals() {
        assert_eq!(
            message_for_signal(ControlCommand::Reload.signal() as i32),
            Some(DaemonMessage::Reload)
        );
        assert_eq!(
            message_for_signal(ControlCommand::Preview.signal() as i32),
            Some(DaemonMessage::Preview)
        );
        assert_eq!(
            message_for_signal(ControlCommand::Pause.signal() as i32),
            Some(DaemonMessage::TogglePause)
        );
    }
}
