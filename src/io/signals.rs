//! Unix signal handling for the daemon.
//!
//! A background thread turns incoming signals into [`DaemonMessage`]s on the
//! same channel the config watcher uses, so the main loop has a single place
//! to wait on.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

/// Requests handled by the daemon's main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonMessage {
    /// Re-read the configuration (SIGHUP or a file change)
    Reload,
    /// Show the night temperature for the configured preview duration (SIGUSR1)
    Preview,
    /// Toggle disabled-until-tomorrow (SIGUSR2)
    TogglePause,
    /// Leave the main loop (SIGINT, SIGTERM)
    Shutdown,
}

/// Channel ends and run flag shared with the main loop.
pub struct SignalState {
    /// Cleared once a shutdown signal arrived
    pub running: Arc<AtomicBool>,
    pub receiver: Receiver<DaemonMessage>,
    /// Handed to other producers such as the config watcher
    pub sender: Sender<DaemonMessage>,
}

/// Map a raw signal number to the message it requests.
pub fn message_for_signal(signal: i32) -> Option<DaemonMessage> {
    match signal {
        SIGHUP => Some(DaemonMessage::Reload),
        SIGUSR1 => Some(DaemonMessage::Preview),
        SIGUSR2 => Some(DaemonMessage::TogglePause),
        SIGINT | SIGTERM => Some(DaemonMessage::Shutdown),
        _ => None,
    }
}

/// Register the daemon's signals and spawn the forwarding thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (sender, receiver) = std::sync::mpsc::channel();

    let mut signals = Signals::new([SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2])
        .context("Failed to register signal handlers")?;

    let running_clone = running.clone();
    let sender_clone = sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = message_for_signal(sig) else {
                continue;
            };

            log_pipe!();
            match message {
                DaemonMessage::Reload => log_info!("Received configuration reload signal"),
                DaemonMessage::Preview => log_info!("Received preview signal"),
                DaemonMessage::TogglePause => log_info!("Received pause signal"),
                DaemonMessage::Shutdown => {
                    log_info!("Received termination request, shutting down...");
                    running_clone.store(false, Ordering::SeqCst);
                }
            }

            if sender_clone.send(message).is_err() || message == DaemonMessage::Shutdown {
                break;
            }
        }
    });

    Ok(SignalState {
        running,
        receiver,
        sender,
    })
}
