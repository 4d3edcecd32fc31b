//! Deterministic work directory allocation

use std::fs;
use std::path::{Path, PathBuf};
use weft_core::{Error, Fingerprint, Result};

/// Maps fingerprints to sharded work directories
///
/// The first byte of the fingerprint (two hex characters) names the shard
/// directory and the remaining 30 hex characters name the leaf, giving 256-way
/// fan-out under the root: `<root>/3f/2a9c...`.
pub struct WorkDirAllocator;

impl WorkDirAllocator {
    /// Work directory for a fingerprint, without touching the filesystem
    pub fn path_for(root: &Path, fingerprint: &Fingerprint) -> PathBuf {
        let (shard, leaf) = fingerprint.shard();
        root.join(shard).join(leaf)
    }

    /// Derive the work directory and make sure it exists
    pub fn allocate(root: &Path, fingerprint: &Fingerprint) -> Result<PathBuf> {
        let path = Self::path_for(root, fingerprint);
        fs::create_dir_all(&path)
            .map_err(|e| Error::file_system(&path, "create work directory", e))?;
        tracing::trace!(fingerprint = %fingerprint, path = %path.display(), "allocated work directory");
        Ok(path)
    }
}
