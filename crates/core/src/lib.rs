//! Core domain types, errors, and constants for `weft`.
//!
//! This crate holds the pieces every other crate in the workspace agrees on:
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias.
//! - **`types`**: the `Fingerprint` content address used for tasks, groups and
//!   cache records.
//! - **`hash`**: the order-sensitive Hasher that builds fingerprints and
//!   composes them for task groups.
//! - **`constants`**: fixed file names shared between the launcher scripts and
//!   the cache cleanup code.

pub mod constants;
pub mod errors;
pub mod hash;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    hash::{combine, TaskHasher},
    types::*,
};
