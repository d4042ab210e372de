// External I/O operations module
pub mod instance; // Running-instance discovery and signalling
pub mod lock; // Lock file operations
pub mod signals; // Unix signal handling
pub mod state_file; // JSON state published by the daemon
