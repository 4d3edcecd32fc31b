//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for weft operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for weft operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    Configuration { message: String },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Cache store missing, corrupted or otherwise unusable
    Store { store: String, message: String },

    /// Executor refused or failed to accept a task
    Submission { task: String, message: String },

    /// A value that could not be parsed as a fingerprint
    InvalidFingerprint { value: String, message: String },

    /// Malformed line in the run history log
    History {
        path: PathBuf,
        line: usize,
        message: String,
    },
}
