//! Shared utilities for weft
//!
//! Small helpers used by both the task and the cache crates: crash-safe
//! file writes, tracing setup and default directory resolution.

pub mod atomic_file;
pub mod logging;
pub mod paths;

pub use atomic_file::*;
pub use paths::*;
