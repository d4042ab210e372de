//! Structured logging with box-drawing output.
//!
//! Every message is routed through [`write_output`] so the formatting stays
//! consistent between the daemon, the one-shot commands and simulation runs.
//!
//! ## Logging Conventions
//!
//! - **`log_block_start!`**: begins a new conceptual block (state changes,
//!   configuration loads). Prints an empty pipe `┃` then `┣ message`.
//! - **`log_decorated!`**: continues an existing block with `┣ message`.
//! - **`log_indented!`**: nested details, `┃   message`.
//! - **`log_pipe!`**: a single empty `┃` line, used before semantic macros.
//! - **`log_version!`** / **`log_end!`**: header and termination markers.
//! - **`log_info!`**, **`log_warning!`**, **`log_error!`**: semantic messages
//!   with a colored `[LEVEL]` prefix.
//! - **`log_debug!`**: only printed once debug output has been enabled with
//!   [`Log::set_debug`].

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Simulated wall-clock time shown in front of every line during `simulate`
static SIMULATED_TIME: Mutex<Option<DateTime<FixedOffset>>> = Mutex::new(None);

/// Global switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all output, e.g. for `status --json`.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Set the simulated time used as line prefix. `None` disables the prefix.
    pub fn set_simulated_time(time: Option<DateTime<FixedOffset>>) {
        if let Ok(mut guard) = SIMULATED_TIME.lock() {
            *guard = time;
        }
    }

    /// Timestamp prefix for the current line.
    ///
    /// Shows `[YYYY-MM-DD HH:MM:SS] ` while a simulation is running, nothing otherwise.
    pub fn get_timestamp_prefix() -> String {
        match SIMULATED_TIME.lock().ok().and_then(|guard| *guard) {
            Some(time) => format!("[{}] ", time.format("%Y-%m-%d %H:%M:%S")),
            None => String::new(),
        }
    }
}

/// Write already formatted text to stdout.
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┃   {expr}\n"));
        }
    }};
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::common::logger::write_output(&format!("┏ nightlightd v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored text.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an error message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an error without any pipe decoration, for one-shot commands.
#[macro_export]
macro_rules! log_error_standalone {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log an error that terminates the current flow.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log an informational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log a debug message. Suppressed unless debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() && Log::is_debug() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
            );
        }
    }};
}
