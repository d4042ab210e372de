//! Lock file handling for single-instance enforcement.
//!
//! The lock lives in `$XDG_RUNTIME_DIR` (or `/tmp`) and records the PID and
//! custom config directory of the daemon holding it.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::config;
use crate::io::instance::{InstanceInfo, is_instance_running};

/// An acquired lock. The lock is released and the file removed on drop.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Directory for runtime files, `$XDG_RUNTIME_DIR` with a `/tmp` fallback.
pub fn get_runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

pub fn get_main_lock_path() -> PathBuf {
    get_runtime_dir().join(LOCK_FILE_NAME)
}

/// Outcome of a lock attempt.
#[derive(Debug)]
pub enum LockOutcome {
    Acquired(LockFile),
    /// Another live daemon holds the lock
    Held(InstanceInfo),
}

/// Try to become the running instance.
pub fn acquire_lock() -> Result<LockOutcome> {
    acquire_lock_at(&get_main_lock_path(), config::get_custom_config_dir())
}

/// Try to take the lock at `lock_path`, replacing a stale one.
pub fn acquire_lock_at(lock_path: &Path, config_dir: Option<PathBuf>) -> Result<LockOutcome> {
    let info = InstanceInfo {
        pid: std::process::id(),
        config_dir,
    };

    if let Some(lock) = try_lock(lock_path, &info)? {
        return Ok(LockOutcome::Acquired(lock));
    }

    // Someone holds the file; make sure they are still alive
    let contents = std::fs::read_to_string(lock_path).unwrap_or_default();
    match InstanceInfo::from_lock_contents(&contents) {
        Ok(existing) if is_instance_running(existing.pid) => Ok(LockOutcome::Held(existing)),
        Ok(existing) => {
            log_warning!(
                "Removing stale lock file (process {} no longer running)",
                existing.pid
            );
            retry_after_cleanup(lock_path, &info)
        }
        Err(_) => {
            log_warning!("Lock file format invalid, removing");
            retry_after_cleanup(lock_path, &info)
        }
    }
}

fn retry_after_cleanup(lock_path: &Path, info: &InstanceInfo) -> Result<LockOutcome> {
    let _ = std::fs::remove_file(lock_path);
    match try_lock(lock_path, info)? {
        Some(lock) => Ok(LockOutcome::Acquired(lock)),
        None => anyhow::bail!("Failed to acquire lock after removing a stale lock file"),
    }
}

fn try_lock(lock_path: &Path, info: &InstanceInfo) -> Result<Option<LockFile>> {
    // Keep existing content until the lock is ours
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(info.to_lock_contents().as_bytes())?;
    file.flush()?;

    Ok(Some(LockFile {
        file,
        path: lock_path.to_path_buf(),
    }))
}
