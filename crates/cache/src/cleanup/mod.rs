//! Reclaiming cache space from past runs
//!
//! [`CleanupEngine`] walks the records of each selected history entry,
//! deletes the work directories no other run references, and compacts the
//! store index and the history log once a run is fully cleaned. A dry run
//! projects the same decisions without touching anything.

mod simulation;
mod tree;

pub use simulation::DryRunLedger;
pub use tree::{delete_tree, DeleteOutcome, FailedPath};

use crate::history::{HistoryEntry, HistoryFile};
use crate::store::{CacheStore, CacheStoreOpener, RecordEntry, StoreId};
use std::io::Write;
use std::path::{Path, PathBuf};
use weft_core::{Error, Result};

/// Flags controlling a cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// Report what would be removed without removing it
    pub dry_run: bool,
    /// Actually remove files
    pub force: bool,
    /// Remove task outputs but keep launcher logs; leaves the cache intact
    pub keep_logs: bool,
    /// Suppress user-facing messages
    pub quiet: bool,
}

impl CleanOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn force() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_keep_logs(mut self, keep_logs: bool) -> Self {
        self.keep_logs = keep_logs;
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Refuse to run unless either force or dry-run was requested
    pub fn validate(&self) -> Result<()> {
        if !self.force && !self.dry_run {
            return Err(Error::configuration(
                "neither -f or -n specified: refusing to clean",
            ));
        }
        Ok(())
    }
}

/// A history entry whose store could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub store: StoreId,
    pub reason: String,
}

/// What a cleanup pass did
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Work directories deleted (or pruned, with keep-logs)
    pub removed: Vec<PathBuf>,
    /// Work directories a dry run would delete
    pub would_remove: Vec<PathBuf>,
    /// Paths that could not be deleted
    pub failed: Vec<FailedPath>,
    /// Entries with a missing or unreadable store, left untouched
    pub skipped: Vec<StoreFailure>,
    /// Entries whose index or history line could not be removed
    pub compaction_failed: Vec<StoreFailure>,
    /// Runs fully cleaned and dropped from the history
    pub cleaned: Vec<StoreId>,
}

impl CleanupReport {
    /// No deletion or compaction failed; skipped entries do not count
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.compaction_failed.is_empty()
    }
}

/// Applies ref-count-aware deletion to selected history entries
///
/// Consumed by [`run`](Self::run), so every pass starts from a fresh dry-run
/// ledger.
pub struct CleanupEngine<'a, O: CacheStoreOpener> {
    options: CleanOptions,
    opener: &'a O,
    history: &'a HistoryFile,
    ledger: DryRunLedger,
    report: CleanupReport,
}

impl<'a, O: CacheStoreOpener> CleanupEngine<'a, O> {
    /// Validates the options before anything is scanned
    pub fn new(options: CleanOptions, opener: &'a O, history: &'a HistoryFile) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            opener,
            history,
            ledger: DryRunLedger::new(),
            report: CleanupReport::default(),
        })
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Clean `entries` in order, writing user messages to `out`
    pub fn run<W: Write>(mut self, entries: &[HistoryEntry], out: &mut W) -> CleanupReport {
        tracing::info!(
            entries = entries.len(),
            dry_run = self.options.dry_run,
            keep_logs = self.options.keep_logs,
            "starting cache cleanup"
        );

        for entry in entries {
            self.clean_entry(entry, out);
        }

        tracing::info!(
            removed = self.report.removed.len(),
            would_remove = self.report.would_remove.len(),
            failed = self.report.failed.len(),
            skipped = self.report.skipped.len(),
            "cache cleanup finished"
        );
        self.report
    }

    fn clean_entry<W: Write>(&mut self, entry: &HistoryEntry, out: &mut W) {
        let id = entry.store_id();
        let mut store = match self.opener.open_for_read(&id) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(store = %id, error = %e, "nothing to clean, cache store unavailable");
                self.report.skipped.push(StoreFailure {
                    store: id,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let records = store.records();
        let processed = match records {
            Ok(records) => {
                for record in &records {
                    self.clean_record(&mut store, record, out);
                }
                true
            }
            Err(e) => {
                tracing::warn!(store = %id, error = %e, "nothing to clean, cache store unreadable");
                self.report.skipped.push(StoreFailure {
                    store: id.clone(),
                    reason: e.to_string(),
                });
                false
            }
        };

        if let Err(e) = store.close() {
            tracing::warn!(store = %id, error = %e, "failed to close cache store");
        }

        if !processed || self.options.dry_run || self.options.keep_logs {
            return;
        }
        self.compact(store, entry, id);
    }

    fn clean_record<S: CacheStore, W: Write>(
        &mut self,
        store: &mut S,
        entry: &RecordEntry,
        out: &mut W,
    ) {
        let work_dir = &entry.record.work_dir;

        if self.options.dry_run {
            if self.ledger.visit(entry.fingerprint, entry.ref_count) {
                tracing::debug!(fingerprint = %entry.fingerprint, "last reference");
                let message = if self.options.keep_logs {
                    format!("Would remove temp files from {}", work_dir.display())
                } else {
                    format!("Would remove {}", work_dir.display())
                };
                self.say(out, &message);
                self.report.would_remove.push(work_dir.clone());
            }
            return;
        }

        let eligible = self.options.keep_logs
            || match store.decrement_ref_count(&entry.fingerprint) {
                Ok(eligible) => eligible,
                Err(e) => {
                    self.record_failure(out, work_dir, e.to_string());
                    return;
                }
            };
        if !eligible {
            tracing::debug!(fingerprint = %entry.fingerprint, "still referenced");
            return;
        }

        let outcome = delete_tree(work_dir, self.options.keep_logs);
        if outcome.is_success() {
            let message = if self.options.keep_logs {
                format!("Removed temp files from {}", work_dir.display())
            } else {
                format!("Removed {}", work_dir.display())
            };
            self.say(out, &message);
            self.report.removed.push(work_dir.clone());
        } else {
            for failed in outcome.failed {
                self.record_failure(out, &failed.path, failed.reason);
            }
        }
    }

    fn compact<S: CacheStore>(&mut self, mut store: S, entry: &HistoryEntry, id: StoreId) {
        let result = store
            .remove_index()
            .and_then(|()| self.history.delete_entry(entry))
            .and_then(|_| self.history.find_by_session(&entry.session_id))
            .and_then(|remaining| {
                if remaining.is_empty() {
                    store.drop_store()
                } else {
                    Ok(())
                }
            });

        match result {
            Ok(()) => {
                tracing::debug!(store = %id, "run cleaned");
                self.report.cleaned.push(id);
            }
            Err(e) => {
                tracing::warn!(store = %id, error = %e, "failed to compact cache store");
                self.report.compaction_failed.push(StoreFailure {
                    store: id,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn record_failure<W: Write>(&mut self, out: &mut W, path: &Path, reason: String) {
        tracing::warn!(path = %path.display(), reason = %reason, "failed to remove");
        self.say(out, &format!("Failed to remove {}: {reason}", path.display()));
        self.report.failed.push(FailedPath {
            path: path.to_path_buf(),
            reason,
        });
    }

    fn say<W: Write>(&self, out: &mut W, message: &str) {
        if self.options.quiet {
            return;
        }
        if let Err(e) = writeln!(out, "{message}") {
            tracing::debug!(error = %e, "failed to write cleanup message");
        }
    }
}
