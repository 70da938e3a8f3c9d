//! Per-pass summary

use std::fmt;

use super::operation::{OperationKind, SyncOperation};

/// What one pass did.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Operations performed, in order. Planned only, when `dry_run` is set.
    pub operations: Vec<SyncOperation>,
    /// Entries that vanished mid-pass and were reconciled as absent
    pub recovered: usize,
    /// Entries skipped because of an I/O fault, as messages
    pub errors: Vec<String>,
    pub dry_run: bool,
}

impl PassReport {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Number of operations of `kind`.
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }

    /// True when the pass neither changed anything nor hit an error.
    pub fn is_clean(&self) -> bool {
        self.operations.is_empty() && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} copied, {} deleted, {} recovered, {} failed",
            self.count(OperationKind::Create),
            self.count(OperationKind::Copy),
            self.count(OperationKind::Delete),
            self.recovered,
            self.errors.len()
        )
    }
}
