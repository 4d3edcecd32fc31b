//! Ref-counted cache store contract
//!
//! A store holds, per task fingerprint, the task's [`CacheRecord`] and the
//! number of pipeline runs relying on it. Each store instance is scoped to one
//! run of one session ([`StoreId`]); its index lists the fingerprints that run
//! produced or reused. Mutation is single-writer: nothing here guards against
//! two cleanup passes over the same store.

mod db;
mod index;

pub use db::{CacheDb, CacheDbOpener};

use crate::record::CacheRecord;
use std::fmt;
use uuid::Uuid;
use weft_core::{Error, Fingerprint, Result};

/// Identity of one run's view of a session cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId {
    /// Session owning the backing data; resumed runs share it
    pub session_id: Uuid,
    /// Run whose index is read
    pub run_name: String,
}

impl StoreId {
    pub fn new(session_id: Uuid, run_name: impl Into<String>) -> Self {
        Self {
            session_id,
            run_name: run_name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_run_name(&self.run_name)
    }
}

/// Reject run names that cannot name an index file or a history field
pub fn validate_run_name(name: &str) -> Result<()> {
    let unusable = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\t', '\n', '\r', '\0']);
    if unusable {
        return Err(Error::configuration(format!("invalid run name {name:?}")));
    }
    Ok(())
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.run_name)
    }
}

/// One record as seen while iterating a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub fingerprint: Fingerprint,
    pub record: CacheRecord,
    pub ref_count: u32,
}

/// Operations the cleanup engine needs from a cache store
pub trait CacheStore {
    fn id(&self) -> &StoreId;

    /// Records of this run in index order
    ///
    /// The order is stable for a given store instance and each fingerprint
    /// appears at most once.
    fn records(&self) -> Result<Vec<RecordEntry>>;

    /// Visit every record in index order
    fn for_each_record<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Fingerprint, &CacheRecord, u32),
        Self: Sized,
    {
        for entry in self.records()? {
            visit(&entry.fingerprint, &entry.record, entry.ref_count);
        }
        Ok(())
    }

    /// Drop one reference; returns true once the record is unreferenced
    ///
    /// Absent fingerprints are a no-op returning false. The count never goes
    /// below zero.
    fn decrement_ref_count(&mut self, fingerprint: &Fingerprint) -> Result<bool>;

    /// Delete this run's index
    fn remove_index(&mut self) -> Result<()>;

    /// Delete the session's backing data entirely
    fn drop_store(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Opens stores for reading
pub trait CacheStoreOpener {
    type Store: CacheStore;

    fn open_for_read(&self, id: &StoreId) -> Result<Self::Store>;
}
