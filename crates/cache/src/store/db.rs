//! File-backed cache store
//!
//! Layout under the cache directory:
//!
//! ```text
//! <cache_dir>/<session_id>/db/<fingerprint>.json   { "ref_count": n, "record": {...} }
//! <cache_dir>/<session_id>/index.<run_name>        one fingerprint per line
//! ```
//!
//! A record's ref count equals the number of run indexes listing it: the
//! first run to reference a fingerprint creates the record with a count of
//! one and every other run of the session adds one.

use super::index::{self, IndexEntry};
use super::{CacheStore, CacheStoreOpener, RecordEntry, StoreId};
use crate::record::CacheRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use weft_core::{Error, Fingerprint, Result};
use weft_utils::write_atomic_json;

const DB_DIR: &str = "db";
const INDEX_PREFIX: &str = "index.";

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    ref_count: u32,
    record: CacheRecord,
}

/// Cache store for one run of one session
#[derive(Debug)]
pub struct CacheDb {
    id: StoreId,
    session_dir: PathBuf,
    indexed: HashSet<Fingerprint>,
    closed: bool,
}

impl CacheDb {
    /// Directory holding a session's data
    pub fn session_dir(cache_dir: &Path, session_id: &Uuid) -> PathBuf {
        cache_dir.join(session_id.to_string())
    }

    /// Open a store for a running pipeline, creating it when missing
    pub fn open_for_write(cache_dir: &Path, id: StoreId) -> Result<Self> {
        id.validate()?;
        let session_dir = Self::session_dir(cache_dir, &id.session_id);
        let db_dir = session_dir.join(DB_DIR);
        fs::create_dir_all(&db_dir)
            .map_err(|e| Error::file_system(&db_dir, "create cache database", e))?;

        let mut db = Self {
            id,
            session_dir,
            indexed: HashSet::new(),
            closed: false,
        };
        let index_path = db.index_path();
        if index_path.is_file() {
            db.indexed = index::read_index(&index_path, &db.id.to_string())?
                .into_iter()
                .map(|entry| entry.fingerprint)
                .collect();
        }

        tracing::debug!(store = %db.id, "opened cache store for write");
        Ok(db)
    }

    /// Open an existing store for cleanup
    pub fn open_for_read(cache_dir: &Path, id: StoreId) -> Result<Self> {
        id.validate()?;
        let session_dir = Self::session_dir(cache_dir, &id.session_id);
        if !session_dir.join(DB_DIR).is_dir() {
            return Err(Error::store(id.to_string(), "missing cache database"));
        }

        let db = Self {
            id,
            session_dir,
            indexed: HashSet::new(),
            closed: false,
        };
        if !db.index_path().is_file() {
            return Err(Error::store(db.id.to_string(), "missing run index"));
        }

        tracing::debug!(store = %db.id, "opened cache store for read");
        Ok(db)
    }

    /// Store the result of a task produced by this run
    pub fn put_record(&mut self, fingerprint: Fingerprint, record: CacheRecord) -> Result<()> {
        self.ensure_open()?;
        let ref_count = match self.read_stored(&fingerprint)? {
            None => 1,
            Some(stored) if self.indexed.contains(&fingerprint) => stored.ref_count,
            Some(stored) => stored.ref_count.saturating_add(1),
        };
        self.write_stored(&fingerprint, &StoredRecord { ref_count, record })?;
        self.index(fingerprint, false)
    }

    /// Reference an existing record from this run, e.g. when a resumed run reuses it
    ///
    /// Returns false when no record exists for the fingerprint.
    pub fn cache_hit(&mut self, fingerprint: Fingerprint) -> Result<bool> {
        self.ensure_open()?;
        let Some(mut stored) = self.read_stored(&fingerprint)? else {
            return Ok(false);
        };
        if self.indexed.contains(&fingerprint) {
            return Ok(true);
        }
        stored.ref_count = stored.ref_count.saturating_add(1);
        self.write_stored(&fingerprint, &stored)?;
        self.index(fingerprint, true)?;
        Ok(true)
    }

    /// Look up a single record
    pub fn get(&self, fingerprint: &Fingerprint) -> Result<Option<RecordEntry>> {
        Ok(self.read_stored(fingerprint)?.map(|stored| RecordEntry {
            fingerprint: *fingerprint,
            record: stored.record,
            ref_count: stored.ref_count,
        }))
    }

    fn index(&mut self, fingerprint: Fingerprint, cached: bool) -> Result<()> {
        if self.indexed.insert(fingerprint) {
            index::append_index(&self.index_path(), IndexEntry { fingerprint, cached })?;
        }
        Ok(())
    }

    fn index_path(&self) -> PathBuf {
        self.session_dir
            .join(format!("{INDEX_PREFIX}{}", self.id.run_name))
    }

    fn record_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.session_dir
            .join(DB_DIR)
            .join(format!("{fingerprint}.json"))
    }

    fn read_stored(&self, fingerprint: &Fingerprint) -> Result<Option<StoredRecord>> {
        let path = self.record_path(fingerprint);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                Error::store(
                    self.id.to_string(),
                    format!("corrupted record {fingerprint}: {e}"),
                )
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::file_system(path, "read cache record", e)),
        }
    }

    fn write_stored(&self, fingerprint: &Fingerprint, stored: &StoredRecord) -> Result<()> {
        write_atomic_json(&self.record_path(fingerprint), stored)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::store(self.id.to_string(), "store is closed"));
        }
        Ok(())
    }
}

impl CacheStore for CacheDb {
    fn id(&self) -> &StoreId {
        &self.id
    }

    fn records(&self) -> Result<Vec<RecordEntry>> {
        self.ensure_open()?;
        let entries = index::read_index(&self.index_path(), &self.id.to_string())?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.read_stored(&entry.fingerprint)? {
                Some(stored) => records.push(RecordEntry {
                    fingerprint: entry.fingerprint,
                    record: stored.record,
                    ref_count: stored.ref_count,
                }),
                None => tracing::trace!(
                    store = %self.id,
                    fingerprint = %entry.fingerprint,
                    cached = entry.cached,
                    "indexed record no longer in the database"
                ),
            }
        }
        Ok(records)
    }

    fn decrement_ref_count(&mut self, fingerprint: &Fingerprint) -> Result<bool> {
        self.ensure_open()?;
        let Some(mut stored) = self.read_stored(fingerprint)? else {
            return Ok(false);
        };

        if stored.ref_count <= 1 {
            let path = self.record_path(fingerprint);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::file_system(path, "remove cache record", e)),
            }
            return Ok(true);
        }

        stored.ref_count -= 1;
        self.write_stored(fingerprint, &stored)?;
        Ok(false)
    }

    fn remove_index(&mut self) -> Result<()> {
        index::remove_index(&self.index_path())
    }

    fn drop_store(&mut self) -> Result<()> {
        match fs::remove_dir_all(&self.session_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::file_system(&self.session_dir, "drop cache store", e)),
        }
        tracing::debug!(store = %self.id, "dropped cache store");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        tracing::debug!(store = %self.id, "closed cache store");
        Ok(())
    }
}

/// Opens [`CacheDb`] stores under a cache directory
#[derive(Debug, Clone)]
pub struct CacheDbOpener {
    cache_dir: PathBuf,
}

impl CacheDbOpener {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl CacheStoreOpener for CacheDbOpener {
    type Store = CacheDb;

    fn open_for_read(&self, id: &StoreId) -> Result<CacheDb> {
        CacheDb::open_for_read(&self.cache_dir, id.clone())
    }
}
