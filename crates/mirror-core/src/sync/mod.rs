//! Sync executor
//!
//! This module provides:
//! - **engine**: applies directory comparisons depth-first and runs the polling loop
//! - **operation**: the record of one mutation performed on the replica
//! - **sink**: destinations for operation records (log file + console)
//! - **report**: per-pass summary of operations, recoveries and failures

mod engine;
mod operation;
mod report;
mod sink;

pub use engine::{SyncEngine, SyncOptions};
pub use operation::{OperationKind, SyncOperation};
pub use report::PassReport;
pub use sink::{OperationLog, OperationSink};
