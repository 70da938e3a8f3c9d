//! Destinations for operation records

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use mirror_fs::io;

use super::operation::SyncOperation;
use crate::Result;

/// Receives one record per mutation performed by the engine.
pub trait OperationSink {
    fn record(&mut self, operation: &SyncOperation) -> Result<()>;
}

/// Collects records in memory.
impl OperationSink for Vec<SyncOperation> {
    fn record(&mut self, operation: &SyncOperation) -> Result<()> {
        self.push(operation.clone());
        Ok(())
    }
}

impl<S: OperationSink + ?Sized> OperationSink for &mut S {
    fn record(&mut self, operation: &SyncOperation) -> Result<()> {
        (**self).record(operation)
    }
}

/// Durable operation log: appends each record to a file, never truncating
/// it, and mirrors the same line to a console stream.
pub struct OperationLog {
    path: PathBuf,
    file: File,
    console: Box<dyn Write + Send>,
}

impl OperationLog {
    /// Open `path` for appending, mirroring records to stdout.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_console(path, Box::new(std::io::stdout()))
    }

    /// Open `path` for appending, mirroring records to `console`.
    pub fn with_console(path: impl Into<PathBuf>, console: Box<dyn Write + Send>) -> Result<Self> {
        let path = path.into();
        let file = io::open_append(&path)?;
        Ok(Self {
            path,
            file,
            console,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OperationSink for OperationLog {
    fn record(&mut self, operation: &SyncOperation) -> Result<()> {
        let line = operation.log_line();
        io::append_line(&mut self.file, &self.path, &line)?;
        writeln!(self.console, "{line}")?;
        Ok(())
    }
}
