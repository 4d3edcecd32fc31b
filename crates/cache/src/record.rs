//! Cached task results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result metadata persisted for a completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Task name at the time it ran
    pub name: String,
    /// Work directory holding the task's outputs
    pub work_dir: PathBuf,
    /// Exit status, `None` when the task never reported one
    #[serde(default)]
    pub exit_status: Option<i32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    pub fn new(name: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            work_dir: work_dir.into(),
            exit_status: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn with_exit_status(mut self, exit_status: i32) -> Self {
        self.exit_status = Some(exit_status);
        self
    }

    #[must_use]
    pub fn with_timing(mut self, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.completed_at = Some(completed_at);
        self
    }

    /// Wall-clock duration, when both timestamps are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}
