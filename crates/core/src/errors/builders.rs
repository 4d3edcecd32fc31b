//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a cache store error
    #[must_use]
    pub fn store(store: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Store {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a submission error
    #[must_use]
    pub fn submission(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Submission {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create an invalid fingerprint error
    #[must_use]
    pub fn invalid_fingerprint(value: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidFingerprint {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a history parse error
    #[must_use]
    pub fn history(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Error::History {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
