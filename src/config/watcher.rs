//! Hot reloading of the configuration.
//!
//! The configuration directory is watched rather than the files themselves,
//! since most editors save by replacing the file. Relevant events are turned
//! into [`DaemonMessage::Reload`] on the daemon's channel.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use super::Config;
use crate::common::constants::CONFIG_FILE_NAME;
use crate::common::utils::private_path;
use crate::io::signals::DaemonMessage;

/// Editors often write a file in several steps; collapse those into one reload.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches `nightlightd.toml` and `geo.toml` for changes.
pub struct ConfigWatcher {
    sender: Sender<DaemonMessage>,
    config_dir: PathBuf,
}

impl ConfigWatcher {
    pub fn new(sender: Sender<DaemonMessage>, config_dir: PathBuf) -> Self {
        Self { sender, config_dir }
    }

    /// Spawn the watcher thread.
    ///
    /// The thread exits once the daemon's receiver is dropped.
    pub fn start(self) -> Result<()> {
        if !self.config_dir.is_dir() {
            log_debug!(
                "Config directory {} does not exist, hot reload disabled",
                private_path(&self.config_dir)
            );
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&self.config_dir, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!(
                    "Failed to watch directory: {}",
                    private_path(&self.config_dir)
                )
            })?;

        log_debug!(
            "Watching {} for configuration changes",
            private_path(&self.config_dir)
        );

        let sender = self.sender;
        thread::spawn(move || {
            // The watcher stops when dropped
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !event.paths.iter().any(|path| is_config_file(path)) {
                    continue;
                }

                if last_reload.is_some_and(|at| at.elapsed() < DEBOUNCE) {
                    continue;
                }

                log_debug!("Configuration file change detected");

                if sender.send(DaemonMessage::Reload).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Whether a changed path is one of the files the configuration is read from.
pub(crate) fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == CONFIG_FILE_NAME || name == "geo.toml")
}

/// Start watching the active configuration directory.
pub fn start_config_watcher(sender: Sender<DaemonMessage>) -> Result<()> {
    let config_path = Config::get_config_path()?;
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .context("Could not determine config directory")?;
    ConfigWatcher::new(sender, config_dir).start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_config_file() {
        assert!(is_config_file(Path::new("/home/u/.config/nightlightd/nightlightd.toml")));
        assert!(is_config_file(Path::new("/home/u/.config/nightlightd/geo.toml")));
        assert!(!is_config_file(Path::new("/home/u/.config/nightlightd/nightlightd.toml~")));
        assert!(!is_config_file(Path::new("/home/u/.config/nightlightd/.geo.toml.swp")));
        assert!(!is_config_file(Path::new("/")));
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let watcher = ConfigWatcher::new(tx, PathBuf::from("/nonexistent/nightlightd"));
        assert!(watcher.start().is_ok());
    }
}
