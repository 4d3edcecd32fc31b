//! Task cache for weft
//!
//! This crate provides the persistent side of task caching:
//! - Ref-counted cache records keyed by task fingerprint
//! - A file-backed store with one index per pipeline run
//! - The append-only run history
//! - Cleanup of stale cache entries, real or simulated

pub mod cleanup;
pub mod config;
pub mod history;
pub mod record;
pub mod store;

pub use cleanup::{CleanOptions, CleanupEngine, CleanupReport, FailedPath, StoreFailure};
pub use config::{CacheConfig, CacheConfigBuilder, ConfigSource};
pub use history::{HistoryEntry, HistoryFile, HistorySelection, RunStatus};
pub use record::CacheRecord;
pub use store::{CacheDb, CacheDbOpener, CacheStore, CacheStoreOpener, RecordEntry, StoreId};
