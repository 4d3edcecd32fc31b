//! Atomic file operations to prevent torn cache records and history files

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use weft_core::{Error, Result};

/// Write data to a file atomically by writing to a sibling temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::configuration(format!("no parent directory for {}", path.display())))?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    // Same directory as the target so the rename never crosses a filesystem
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| Error::file_system(parent, "create temporary file", e))?;

    temp.write_all(content)
        .map_err(|e| Error::file_system(temp.path(), "write temporary file", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::file_system(temp.path(), "sync temporary file", e))?;

    temp.persist(path)
        .map_err(|e| Error::file_system(path, "atomic rename", e.error))?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Write string content to a file atomically
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Serialize a value as pretty JSON and write it atomically
pub fn write_atomic_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| Error::Json {
        message: format!("failed to serialize {}", path.display()),
        source: e,
    })?;
    write_atomic(path, &json)
}
