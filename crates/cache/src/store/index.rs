//! Per-run index files
//!
//! One line per fingerprint, `<hex>\t<cached>`, where `cached` is `1` when the
//! run reused an existing record and `0` when it produced it.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use weft_core::{Error, Fingerprint, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    pub fingerprint: Fingerprint,
    pub cached: bool,
}

/// Read an index, keeping only the first occurrence of each fingerprint
pub(crate) fn read_index(path: &Path, store: &str) -> Result<Vec<IndexEntry>> {
    let content =
        fs::read_to_string(path).map_err(|e| Error::file_system(path, "read run index", e))?;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (hex, flag) = line.split_once('\t').unwrap_or((line, "0"));
        let fingerprint = Fingerprint::from_hex(hex).map_err(|e| {
            Error::store(store, format!("corrupted index line {}: {e}", number + 1))
        })?;
        if seen.insert(fingerprint) {
            entries.push(IndexEntry {
                fingerprint,
                cached: flag == "1",
            });
        }
    }
    Ok(entries)
}

pub(crate) fn append_index(path: &Path, entry: IndexEntry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::file_system(path, "open run index", e))?;
    writeln!(file, "{}\t{}", entry.fingerprint, u8::from(entry.cached))
        .map_err(|e| Error::file_system(path, "append run index", e))
}

pub(crate) fn remove_index(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::file_system(path, "remove run index", e)),
    }
}
