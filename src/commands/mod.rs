//! Command-line command handlers for nightlightd.
//!
//! `run` hosts the daemon; `status`, `sun`, `simulate` and `location` work on
//! their own; `control` talks to a running daemon through signals.

pub mod control;
pub mod location;
pub mod run;
pub mod simulate;
pub mod status;
pub mod sun;
