//! Core engine for one-way periodic directory mirroring
//!
//! After each pass the replica tree matches the source tree exactly.
//!
//! - **Tree differencer** ([`diff`]): classifies the entries of one directory
//!   pair into source-only, replica-only, changed, identical, common
//!   subdirectories and skipped
//! - **Sync executor** ([`sync`]): applies those classifications depth-first,
//!   records every mutation to an [`OperationSink`], and drives the polling
//!   loop
//!
//! # Architecture
//!
//! ```text
//!        mirror-cli
//!            |
//!       mirror-core
//!            |
//!        mirror-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mirror_core::{OperationLog, SyncEngine, SyncOptions, SyncTarget, Ticker};
//! use std::time::Duration;
//!
//! fn example() -> mirror_core::Result<()> {
//!     let target = SyncTarget::new("source", "replica")?;
//!     let log = OperationLog::open("log.txt")?;
//!     let mut engine = SyncEngine::new(target, log, SyncOptions::default());
//!     engine.run(&Ticker::new(Duration::from_secs(60)));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod schedule;
pub mod sync;
pub mod target;

pub use config::MirrorConfig;
pub use diff::{CompareMode, DirComparison, compare};
pub use error::{Error, Result};
pub use schedule::{ShutdownHandle, Ticker};
pub use sync::{
    OperationKind, OperationLog, OperationSink, PassReport, SyncEngine, SyncOperation, SyncOptions,
};
pub use target::{Role, SyncTarget};
