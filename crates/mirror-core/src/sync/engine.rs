//! SyncEngine implementation
//!
//! Walks a source/replica pair depth-first, applying each directory's
//! [`DirComparison`] before descending into its common subdirectories.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use mirror_fs::io;
use mirror_fs::listing::EntryKind;

use super::operation::{OperationKind, SyncOperation};
use super::report::PassReport;
use super::sink::OperationSink;
use crate::diff::{self, CompareMode, DirComparison};
use crate::schedule::Ticker;
use crate::target::SyncTarget;
use crate::Error;

/// Options for a sync pass
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// How files present on both sides are compared
    pub compare: CompareMode,
    /// If true, classify and report without touching the replica or the sink
    pub dry_run: bool,
}

/// One-way mirroring engine.
///
/// Owns the roots, the operation sink and the "last synchronized" timestamp.
/// Nothing here is shared; passes run strictly one after another.
pub struct SyncEngine<S> {
    target: SyncTarget,
    sink: S,
    options: SyncOptions,
    last_synced: Option<DateTime<Local>>,
}

impl<S: OperationSink> SyncEngine<S> {
    pub fn new(target: SyncTarget, sink: S, options: SyncOptions) -> Self {
        Self {
            target,
            sink,
            options,
            last_synced: None,
        }
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Completion time of the most recent pass.
    pub fn last_synced(&self) -> Option<DateTime<Local>> {
        self.last_synced
    }

    /// Run passes until `ticker` is shut down, waiting one interval after
    /// each pass. Without a shutdown request this never returns.
    pub fn run(&mut self, ticker: &Ticker) {
        loop {
            self.run_pass();
            if !ticker.wait() {
                tracing::info!("Shutdown requested, stopping sync loop");
                break;
            }
        }
    }

    /// Perform one full recursive pass over the roots.
    ///
    /// Never fails as a whole: per-entry faults land in the report and the
    /// pass moves on.
    pub fn run_pass(&mut self) -> PassReport {
        tracing::info!(
            source = %self.target.source().display(),
            replica = %self.target.replica().display(),
            "Synchronizing..."
        );

        let mut report = if self.options.dry_run {
            PassReport::dry_run()
        } else {
            PassReport::default()
        };

        let source = self.target.source().to_path_buf();
        let replica = self.target.replica().to_path_buf();

        match diff::compare(&source, &replica, self.options.compare) {
            Ok(comparison) => self.apply(&source, &replica, &comparison, &mut report),
            Err(e) => {
                // A vanished root is never deleted; the next pass retries.
                tracing::error!(error = %e, "Cannot list sync roots, pass aborted");
                report.errors.push(e.to_string());
            }
        }

        self.last_synced = Some(Local::now());

        if report.has_errors() {
            tracing::warn!(%report, "Pass finished with errors");
        } else {
            tracing::info!(%report, "Pass finished");
        }
        report
    }

    fn sync_dir(&mut self, source_dir: &Path, replica_dir: &Path, report: &mut PassReport) {
        match diff::compare(source_dir, replica_dir, self.options.compare) {
            Ok(comparison) => self.apply(source_dir, replica_dir, &comparison, report),
            Err(e) if e.is_vanished() => {
                tracing::debug!(
                    source = %source_dir.display(),
                    replica = %replica_dir.display(),
                    "Directory vanished mid-pass"
                );
                report.recovered += 1;
                if fs::symlink_metadata(source_dir).is_err() {
                    self.purge(replica_dir, report);
                }
            }
            Err(e) => self.fail(e, report),
        }
    }

    fn apply(
        &mut self,
        source_dir: &Path,
        replica_dir: &Path,
        comparison: &DirComparison,
        report: &mut PassReport,
    ) {
        tracing::trace!(dir = %replica_dir.display(), ?comparison, "Applying comparison");

        for (name, reason) in &comparison.skipped {
            tracing::warn!(path = %source_dir.join(name).display(), %reason, "Entry skipped");
            report.errors.push(reason.clone());
        }

        for name in &comparison.source_only {
            self.create(&source_dir.join(name), &replica_dir.join(name), report);
        }
        for name in &comparison.replica_only {
            self.delete(&replica_dir.join(name), report);
        }
        for name in &comparison.changed {
            self.update(&source_dir.join(name), &replica_dir.join(name), report);
        }
        for name in &comparison.common_subdirs {
            self.sync_dir(&source_dir.join(name), &replica_dir.join(name), report);
        }
    }

    /// Materialize a source-only entry. Directories are copied wholesale.
    fn create(&mut self, source: &Path, replica: &Path, report: &mut PassReport) {
        let kind = match io::entry_kind(source) {
            Ok(EntryKind::Special) => {
                let path = source.to_path_buf();
                return self.fail(mirror_fs::Error::SpecialFile { path }, report);
            }
            Ok(kind) => kind,
            Err(e) => return self.recover_or_fail(e, replica, report),
        };

        // A dangling link never shows up in listings; never write through it.
        if !self.options.dry_run && fs::symlink_metadata(replica).is_ok() {
            self.delete(replica, report);
        }

        let mut skipped = 0;
        if !self.options.dry_run {
            let result = match kind {
                EntryKind::Dir => io::copy_tree(source, replica).map(|stats| {
                    tracing::debug!(
                        path = %replica.display(),
                        files = stats.files,
                        dirs = stats.dirs,
                        skipped = stats.skipped,
                        "Copied subtree"
                    );
                    skipped = stats.skipped;
                }),
                _ => io::copy_file(source, replica).map(|_| ()),
            };
            if let Err(e) = result {
                return self.recover_or_fail(e, replica, report);
            }
        }

        self.emit(OperationKind::Create, replica, kind.is_dir(), report);

        if skipped > 0 {
            report.errors.push(format!(
                "{}: {skipped} special file(s) not copied",
                source.display()
            ));
        }
    }

    /// Remove a replica-only entry.
    fn delete(&mut self, replica: &Path, report: &mut PassReport) {
        if self.options.dry_run {
            let is_dir = fs::symlink_metadata(replica).is_ok_and(|m| m.is_dir());
            return self.emit(OperationKind::Delete, replica, is_dir, report);
        }

        match io::remove_entry(replica) {
            Ok(kind) => self.emit(OperationKind::Delete, replica, kind.is_dir(), report),
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %replica.display(), "Already absent");
                report.recovered += 1;
            }
            Err(e) => self.fail(e, report),
        }
    }

    /// Bring a divergent replica entry in line with the source.
    fn update(&mut self, source: &Path, replica: &Path, report: &mut PassReport) {
        let source_kind = match io::entry_kind(source) {
            Ok(kind) => kind,
            Err(e) => return self.recover_or_fail(e, replica, report),
        };
        let replica_kind = match io::entry_kind(replica) {
            Ok(kind) => Some(kind),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                // Broken or looping link; removing it deletes the link only.
                tracing::debug!(error = %e, path = %replica.display(), "Replacing unreadable entry");
                Some(EntryKind::Special)
            }
        };

        match (source_kind, replica_kind) {
            (EntryKind::Special, _) => {
                let path = source.to_path_buf();
                self.fail(mirror_fs::Error::SpecialFile { path }, report);
            }
            (EntryKind::File, Some(EntryKind::File)) => {
                if !self.options.dry_run
                    && let Err(e) = io::replace_file(source, replica)
                {
                    return self.recover_or_fail(e, replica, report);
                }
                self.emit(OperationKind::Copy, replica, false, report);
            }
            (EntryKind::Dir, Some(EntryKind::Dir)) => self.sync_dir(source, replica, report),
            (_, None) => self.create(source, replica, report),
            _ => {
                // Kinds differ, e.g. a file on one side and a directory on the other.
                self.delete(replica, report);
                self.create(source, replica, report);
            }
        }
    }

    /// Handle a failed action on the entry mirrored at `replica`.
    ///
    /// A missing source means the entry vanished mid-pass: whatever exists
    /// at `replica` must go. Anything else is recorded and skipped.
    fn recover_or_fail(&mut self, error: mirror_fs::Error, replica: &Path, report: &mut PassReport) {
        if !error.is_not_found() {
            return self.fail(error, report);
        }

        tracing::debug!(error = %error, path = %replica.display(), "Entry vanished mid-pass");
        report.recovered += 1;
        self.purge(replica, report);
    }

    fn purge(&mut self, replica: &Path, report: &mut PassReport) {
        if !self.options.dry_run && fs::symlink_metadata(replica).is_ok() {
            self.delete(replica, report);
        }
    }

    fn emit(&mut self, kind: OperationKind, path: &Path, is_dir: bool, report: &mut PassReport) {
        let operation = SyncOperation::new(kind, path, is_dir);

        if !self.options.dry_run
            && let Err(e) = self.sink.record(&operation)
        {
            tracing::warn!(error = %e, %operation, "Failed to record operation");
            report.errors.push(format!("log: {e}"));
        }

        report.operations.push(operation);
    }

    fn fail(&mut self, error: impl Into<Error>, report: &mut PassReport) {
        let error = error.into();
        tracing::warn!(error = %error, "Entry skipped");
        report.errors.push(error.to_string());
    }
}
