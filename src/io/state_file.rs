//! JSON state file published by the daemon.
//!
//! Written to `$XDG_RUNTIME_DIR/nightlightd/state.json` after every observable
//! change. The file is replaced atomically so readers never see a partial
//! document.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::common::constants::{CONFIG_DIR_NAME, STATE_FILE_NAME};
use crate::core::events::NightLightState;
use crate::io::lock::get_runtime_dir;

/// Contents of the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    /// PID of the daemon that wrote the file
    pub pid: u32,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub state: NightLightState,
}

pub fn get_state_path() -> PathBuf {
    get_runtime_dir().join(CONFIG_DIR_NAME).join(STATE_FILE_NAME)
}

/// Atomically replace the state file at `path`.
pub fn write_state(path: &Path, stored: &StoredState) -> Result<()> {
    let dir = path
        .parent()
        .context("State file path has no parent directory")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create state directory {}", dir.display()))?;

    let json = serde_json::to_string_pretty(stored).context("Failed to serialize state")?;

    // Same directory so the rename never crosses filesystems
    let mut tmp = NamedTempFile::new_in(dir).context("Failed to create temporary state file")?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace state file {}", path.display()))?;

    Ok(())
}

/// Read the state file at `path`; `Ok(None)` if there is none.
pub fn read_state(path: &Path) -> Result<Option<StoredState>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Remove the state file, ignoring a missing one.
pub fn remove_state(path: &Path) {
    let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample() -> StoredState {
        StoredState {
            pid: 4242,
            updated_at: FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2017, 2, 8, 21, 0, 0)
                .unwrap(),
            state: NightLightState {
                active: true,
                sunrise: 7.5,
                sunset: 17.0,
                temperature: 4000.0,
                disabled_until_tmw: false,
                forced: false,
            },
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(STATE_FILE_NAME);

        write_state(&path, &sample()).unwrap();
        assert_eq!(read_state(&path).unwrap(), Some(sample()));

        // Overwrite leaves no temporary files behind
        write_state(&path, &sample()).unwrap();
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_flattened_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        write_state(&path, &sample()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["temperature"], 4000.0);
        assert_eq!(value["pid"], 4242);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(read_state(&dir.path().join("none.json")).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        std::fs::write(&path, "{ nope").unwrap();
        assert!(read_state(&path).is_err());
    }
}
