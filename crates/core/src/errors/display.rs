//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
            Error::Store { store, message } => {
                write!(f, "cache store '{store}' error: {message}")
            }
            Error::Submission { task, message } => {
                write!(f, "failed to submit '{task}': {message}")
            }
            Error::InvalidFingerprint { value, message } => {
                write!(f, "invalid fingerprint '{value}': {message}")
            }
            Error::History {
                path,
                line,
                message,
            } => {
                write!(
                    f,
                    "malformed history entry at {}:{}: {}",
                    path.display(),
                    line,
                    message
                )
            }
        }
    }
}
