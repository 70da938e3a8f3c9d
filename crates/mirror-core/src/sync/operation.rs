//! Records of mutations applied to the replica

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp prefix of every log line.
const LOG_TIME_FORMAT: &str = "%H:%M:%S";

/// The kind of mutation performed on a replica entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Entry created from a source-only entry
    Create,
    /// Replica file overwritten with the source's content
    Copy,
    /// Replica-only entry removed
    Delete,
}

/// One mutation actually performed (or, in a dry run, planned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOperation {
    pub kind: OperationKind,
    /// Absolute path of the replica entry acted upon
    pub path: PathBuf,
    pub is_dir: bool,
    pub timestamp: DateTime<Local>,
}

impl SyncOperation {
    pub fn new(kind: OperationKind, path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            kind,
            path: path.into(),
            is_dir,
            timestamp: Local::now(),
        }
    }

    /// Entry name, without its directory.
    pub fn name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }

    /// Directory containing the entry.
    pub fn containing_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// The message prefixed with the local time, as appended to the log.
    pub fn log_line(&self) -> String {
        format!("{}, {}", self.timestamp.format(LOG_TIME_FORMAT), self)
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_dir { "Directory" } else { "File" };
        let name = self.name();
        let dir = self.containing_dir().display();

        match self.kind {
            OperationKind::Create => write!(f, "{label} {name} created in {dir}"),
            OperationKind::Copy => write!(f, "{label} {name} content's copied to {dir}"),
            OperationKind::Delete => write!(f, "{label} {name} deleted from {dir}"),
        }
    }
}
