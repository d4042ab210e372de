//! Running-instance discovery and signalling.
//!
//! Client commands (`reload`, `preview`, `pause`, `stop`) find the daemon
//! through its lock file and talk to it with plain Unix signals.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::io::lock;

/// Contents of the lock file held by a running daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub pid: u32,
    /// Directory given with `--config`, if any
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    /// Parse lock file contents.
    ///
    /// Line 1 is the PID, line 2 the config directory (empty for the default).
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let pid = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .context("Lock file is empty")?
            .trim()
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        if lines.any(|line| !line.trim().is_empty()) {
            anyhow::bail!("Invalid lock file format (expected at most 2 lines)");
        }

        Ok(Self { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match &self.config_dir {
            Some(dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// The daemon currently holding the lock, if it is still alive.
///
/// A custom config directory recorded in the lock is adopted by this process,
/// so commands like `location` edit the file the daemon actually reads.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let lock_path = lock::get_main_lock_path();

    let Ok(contents) = std::fs::read_to_string(&lock_path) else {
        return Ok(None);
    };
    let info = InstanceInfo::from_lock_contents(&contents)?;

    if let Some(ref config_dir) = info.config_dir {
        // Ignore the error if --config was already given
        let _ = crate::config::set_config_dir(Some(config_dir.display().to_string()));
    }

    if is_instance_running(info.pid) {
        Ok(Some(info))
    } else {
        Ok(None)
    }
}

/// PID of the running daemon, or an error naming the problem.
pub fn get_running_instance_pid() -> Result<u32> {
    get_running_instance()?
        .map(|info| info.pid)
        .ok_or_else(|| anyhow::anyhow!("No nightlightd instance running"))
}

pub fn is_instance_running(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

/// Send `signal` to the daemon with the given PID.
pub fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    let raw = i32::try_from(pid).context("PID out of range")?;
    kill(Pid::from_raw(raw), signal)
        .with_context(|| format!("Failed to send {signal} to process {pid}"))
}

/// Ask the daemon to exit and wait until its process is gone.
///
/// Returns `false` if the process is still alive after `timeout`.
pub fn terminate_and_wait(pid: u32, timeout: Duration) -> Result<bool> {
    send_signal(pid, Signal::SIGTERM)?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_instance_running(pid) {
            return Ok(true);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Ok(!is_instance_running(pid))
}
