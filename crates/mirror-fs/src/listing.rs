//! One-level directory listings with metadata signatures

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;

use crate::{Error, Result};

/// Kind of a directory entry, with symlinks resolved to their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
    /// FIFO, socket or device. Never opened: reading a FIFO can block forever.
    Special,
}

impl EntryKind {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_dir() {
            Self::Dir
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Special
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Dir
    }
}

/// Cheap proxy for "file content is unchanged": size plus modification time.
///
/// Two files with equal signatures are assumed identical. Same-size edits
/// that also keep the mtime go unnoticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Signature {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// Metadata captured for one listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub kind: EntryKind,
    pub signature: Signature,
}

/// One level of a directory.
#[derive(Debug, Default)]
pub struct DirListing {
    /// Entries whose metadata was read.
    pub entries: BTreeMap<OsString, EntryMeta>,
    /// Entries that exist but whose metadata lookup failed, e.g. symlink
    /// loops or unreadable link targets.
    pub unreadable: BTreeMap<OsString, Error>,
}

impl DirListing {
    /// True if `name` was seen at all, readable or not.
    pub fn contains(&self, name: &OsString) -> bool {
        self.entries.contains_key(name) || self.unreadable.contains_key(name)
    }
}

/// List the immediate entries of `dir`.
///
/// Entries that disappear between `read_dir` and their metadata lookup are
/// skipped; entries whose metadata cannot be read land in
/// [`DirListing::unreadable`]. A missing `dir` yields an [`Error::Io`] with
/// `NotFound` kind.
pub fn read_entries(dir: &Path) -> Result<DirListing> {
    let mut listing = DirListing::default();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Vanished, or a dangling symlink.
                tracing::debug!(path = %path.display(), "Skipping entry without metadata");
                continue;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read entry metadata");
                listing.unreadable.insert(entry.file_name(), Error::io(&path, e));
                continue;
            }
        };

        listing.entries.insert(
            entry.file_name(),
            EntryMeta {
                kind: EntryKind::from_metadata(&meta),
                signature: Signature::from_metadata(&meta),
            },
        );
    }

    Ok(listing)
}
