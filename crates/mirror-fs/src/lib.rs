//! Filesystem primitives for the directory mirror
//!
//! Provides one-level directory listings with metadata signatures, copies
//! that carry the source modification time, recursive removal, locked
//! appends and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod listing;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::CopyStats;
pub use listing::{DirListing, EntryKind, EntryMeta, Signature};
