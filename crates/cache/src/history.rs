//! Append-only log of pipeline runs
//!
//! One run per line, tab separated:
//!
//! ```text
//! <timestamp>\t<run name>\t<status>\t<session id>\t<command>
//! ```

use crate::store::{validate_run_name, StoreId};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;
use weft_core::{Error, Result};
use weft_utils::write_atomic_string;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_COUNT: usize = 5;

/// Outcome of a run as recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Err,
    /// Run still in progress or killed before reporting
    Unknown,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Ok => "OK",
            RunStatus::Err => "ERR",
            RunStatus::Unknown => "-",
        })
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "OK" => Ok(RunStatus::Ok),
            "ERR" => Ok(RunStatus::Err),
            "-" => Ok(RunStatus::Unknown),
            other => Err(format!("unknown run status '{other}'")),
        }
    }
}

/// One past pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub run_name: String,
    pub status: RunStatus,
    pub session_id: Uuid,
    pub command: String,
}

impl HistoryEntry {
    pub fn new(
        run_name: impl Into<String>,
        session_id: Uuid,
        status: RunStatus,
        command: impl Into<String>,
    ) -> Self {
        Self {
            // The log keeps whole seconds
            timestamp: Utc::now().trunc_subsecs(0),
            run_name: run_name.into(),
            status,
            session_id,
            command: command.into(),
        }
    }

    /// Cache store holding this run's records
    pub fn store_id(&self) -> StoreId {
        StoreId::new(self.session_id, self.run_name.clone())
    }

    fn same_run(&self, other: &HistoryEntry) -> bool {
        self.session_id == other.session_id && self.run_name == other.run_name
    }

    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.run_name,
            self.status,
            self.session_id,
            sanitize(&self.command)
        )
    }

    fn parse_line(line: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = line.splitn(FIELD_COUNT, '\t').collect();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {FIELD_COUNT} tab separated fields, found {}",
                fields.len()
            ));
        }

        let timestamp = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT)
            .map_err(|e| format!("invalid timestamp '{}': {e}", fields[0]))?
            .and_utc();
        let status = fields[2].parse()?;
        let session_id = Uuid::parse_str(fields[3])
            .map_err(|e| format!("invalid session id '{}': {e}", fields[3]))?;

        Ok(Self {
            timestamp,
            run_name: fields[1].to_string(),
            status,
            session_id,
            command: fields[4].to_string(),
        })
    }
}

fn sanitize(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

/// Which history entries a cleanup applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySelection {
    All,
    /// Most recent run only
    Last,
    /// Runs matching a run name or session id
    Named(String),
    /// Runs preceding the named one
    Before(String),
    /// Runs following the named one
    After(String),
    /// Every run except the named one
    But(String),
}

/// The history log on disk
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a run at the end of the log
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        validate_run_name(&entry.run_name)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::file_system(parent, "create history directory", e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::file_system(&self.path, "open history", e))?;
        writeln!(file, "{}", entry.to_line())
            .map_err(|e| Error::file_system(&self.path, "append history", e))
    }

    /// All entries, oldest first; a missing log is empty
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::file_system(&self.path, "read history", e)),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                HistoryEntry::parse_line(line)
                    .map_err(|message| Error::history(&self.path, number + 1, message))
            })
            .collect()
    }

    /// Remove a run from the log, returning whether it was present
    pub fn delete_entry(&self, entry: &HistoryEntry) -> Result<bool> {
        let entries = self.entries()?;
        let before = entries.len();
        let kept: Vec<_> = entries.into_iter().filter(|e| !e.same_run(entry)).collect();
        if kept.len() == before {
            return Ok(false);
        }

        let mut content = String::new();
        for e in &kept {
            content.push_str(&e.to_line());
            content.push('\n');
        }
        write_atomic_string(&self.path, &content)?;

        tracing::debug!(run = %entry.run_name, session = %entry.session_id, "deleted history entry");
        Ok(true)
    }

    /// Entries belonging to a session
    pub fn find_by_session(&self, session_id: &Uuid) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| &e.session_id == session_id)
            .collect())
    }

    /// Entries chosen by a selection, oldest first
    pub fn select(&self, selection: &HistorySelection) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.entries()?;

        let position = |entries: &[HistoryEntry], name: &str| {
            entries
                .iter()
                .position(|e| matches_name(e, name))
                .ok_or_else(|| Error::configuration(format!("unknown run name or session id: {name}")))
        };

        Ok(match selection {
            HistorySelection::All => entries,
            HistorySelection::Last => entries.pop().into_iter().collect(),
            HistorySelection::Named(name) => {
                position(&entries, name)?;
                entries.retain(|e| matches_name(e, name));
                entries
            }
            HistorySelection::Before(name) => {
                let index = position(&entries, name)?;
                entries.truncate(index);
                entries
            }
            HistorySelection::After(name) => {
                let index = position(&entries, name)?;
                entries.split_off(index + 1)
            }
            HistorySelection::But(name) => {
                position(&entries, name)?;
                entries.retain(|e| !matches_name(e, name));
                entries
            }
        })
    }
}

fn matches_name(entry: &HistoryEntry, name: &str) -> bool {
    entry.run_name == name || entry.session_id.to_string() == name
}
