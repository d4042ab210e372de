//! # nightlightd library
//!
//! Internal library for the `nightlightd` binary. It exists to keep the CLI
//! dispatch in `main.rs` thin and to make the engine testable on its own.
//!
//! ## Architecture
//!
//! - **Engine**: `core` holds the [`core::NightLight`] schedule engine, its
//!   timer queue, the temperature smoother and change notification
//! - **Time**: `time` provides injectable clocks and fractional-hour math
//! - **Geographic**: `geo` computes sunrise and sunset
//! - **Configuration**: `config` loads, validates and watches the TOML file
//! - **Daemon**: `daemon` runs the engine on a single-threaded event loop
//! - **Infrastructure**: `io` covers signals, the instance lock and the
//!   published state file; `common` holds the logger and constants
//! - **Commands**: `commands` implements the CLI subcommands parsed by `args`

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod daemon;
pub mod geo;
pub mod io;
pub mod time;

pub use crate::core::{NightLight, ScheduleConfig};
