//! Task grouping and submission for weft
//!
//! This crate turns individual task runs into submissions for an executor
//! backend: it batches tasks into groups under a size threshold, derives the
//! group's composite fingerprint and work directory, writes the launcher
//! scripts, and hands everything to the [`Executor`] collaborator.

pub mod collector;
pub mod executor;
pub mod launcher;
pub mod task;
pub mod workdir;

pub use collector::TaskGroupCollector;
pub use executor::{Executor, LauncherPreparer};
pub use launcher::{GroupLauncher, TaskLauncher};
pub use task::*;
pub use workdir::WorkDirAllocator;
