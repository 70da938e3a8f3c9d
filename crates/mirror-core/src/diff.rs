//! Tree differencer
//!
//! Compares the immediate entries of one source/replica directory pair. No
//! recursion happens here; the executor descends into common subdirectories.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::Path;

use mirror_fs::checksum::compute_file_checksum;
use mirror_fs::listing::{self, DirListing, EntryKind, EntryMeta};
use serde::{Deserialize, Serialize};

use crate::Result;

/// How two files with the same name are judged equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Equal size and modification time. Cheap, but blind to same-size edits
    /// that keep the mtime.
    #[default]
    Metadata,
    /// Equal size and SHA-256 digest. Reads both files whenever sizes match.
    Checksum,
}

/// Classification of every entry of one directory pair.
///
/// Names are relative to the pair. The sets are pairwise disjoint and
/// together cover the union of both listings, unreadable entries included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirComparison {
    /// Present only in the source: to be created.
    pub source_only: BTreeSet<OsString>,
    /// Present only in the replica: to be deleted.
    pub replica_only: BTreeSet<OsString>,
    /// Present on both sides but divergent: to be overwritten. Includes
    /// names that are a file on one side and a directory on the other.
    pub changed: BTreeSet<OsString>,
    /// Directories present on both sides: to be recursed into.
    pub common_subdirs: BTreeSet<OsString>,
    /// Files present on both sides and judged equal: no action.
    pub identical: BTreeSet<OsString>,
    /// Source entries that cannot be mirrored, with the reason: special
    /// files and entries whose metadata could not be read. Their replica
    /// counterparts are left alone.
    pub skipped: BTreeMap<OsString, String>,
}

impl DirComparison {
    /// True when this level needs no create, delete or copy.
    ///
    /// Common subdirectories may still hold differences further down.
    pub fn is_in_sync(&self) -> bool {
        self.source_only.is_empty() && self.replica_only.is_empty() && self.changed.is_empty()
    }

    /// Every classified name, in all sets.
    pub fn names(&self) -> impl Iterator<Item = &OsString> {
        self.source_only
            .iter()
            .chain(&self.replica_only)
            .chain(&self.changed)
            .chain(&self.common_subdirs)
            .chain(&self.identical)
            .chain(self.skipped.keys())
    }
}

/// Compare the immediate entries of `source_dir` and `replica_dir`.
///
/// # Errors
///
/// Fails if either directory cannot be listed. A directory that vanished
/// reports [`crate::Error::is_vanished`].
pub fn compare(source_dir: &Path, replica_dir: &Path, mode: CompareMode) -> Result<DirComparison> {
    let source = listing::read_entries(source_dir)?;
    let replica = listing::read_entries(replica_dir)?;
    Ok(classify(source_dir, &source, replica_dir, &replica, mode))
}

fn classify(
    source_dir: &Path,
    source: &DirListing,
    replica_dir: &Path,
    replica: &DirListing,
    mode: CompareMode,
) -> DirComparison {
    let mut comparison = DirComparison::default();

    for (name, error) in &source.unreadable {
        comparison.skipped.insert(name.clone(), error.to_string());
    }

    for (name, src) in &source.entries {
        if src.kind == EntryKind::Special {
            let reason = mirror_fs::Error::SpecialFile {
                path: source_dir.join(name),
            };
            comparison.skipped.insert(name.clone(), reason.to_string());
            continue;
        }

        let Some(rep) = replica.entries.get(name) else {
            // An unreadable replica entry is replaced like any mismatch.
            let bucket = if replica.unreadable.contains_key(name) {
                &mut comparison.changed
            } else {
                &mut comparison.source_only
            };
            bucket.insert(name.clone());
            continue;
        };

        let bucket = match (src.kind, rep.kind) {
            (EntryKind::Dir, EntryKind::Dir) => &mut comparison.common_subdirs,
            (EntryKind::File, EntryKind::File)
                if files_match(&source_dir.join(name), src, &replica_dir.join(name), rep, mode) =>
            {
                &mut comparison.identical
            }
            _ => &mut comparison.changed,
        };
        bucket.insert(name.clone());
    }

    comparison.replica_only = replica
        .entries
        .keys()
        .chain(replica.unreadable.keys())
        .filter(|name| !source.contains(name))
        .cloned()
        .collect();

    comparison
}

fn files_match(
    source_path: &Path,
    src: &EntryMeta,
    replica_path: &Path,
    rep: &EntryMeta,
    mode: CompareMode,
) -> bool {
    match mode {
        CompareMode::Metadata => src.signature == rep.signature,
        CompareMode::Checksum => {
            if src.signature.len != rep.signature.len {
                return false;
            }
            // Unreadable files count as changed; the copy surfaces the error.
            match (
                compute_file_checksum(source_path),
                compute_file_checksum(replica_path),
            ) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_test_utils::TreePair;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<OsString> {
        names.iter().map(OsString::from).collect()
    }

    #[test]
    fn classifies_each_entry_into_one_bucket() {
        let pair = TreePair::new();
        pair.source.write("new.txt", "n");
        pair.source.write("same.txt", "s");
        pair.source.write("edited.txt", "v2");
        pair.source.mkdir("shared");
        pair.source.mkdir("fresh_dir");
        pair.replica.write("same.txt", "s");
        pair.replica.write("edited.txt", "v1");
        pair.replica.write("stale.txt", "x");
        pair.replica.mkdir("shared");
        pair.source.set_mtime_secs("same.txt", 1_000);
        pair.replica.set_mtime_secs("same.txt", 1_000);
        pair.source.set_mtime_secs("edited.txt", 2_000);
        pair.replica.set_mtime_secs("edited.txt", 1_000);

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();

        assert_eq!(cmp.source_only, set(&["fresh_dir", "new.txt"]));
        assert_eq!(cmp.replica_only, set(&["stale.txt"]));
        assert_eq!(cmp.changed, set(&["edited.txt"]));
        assert_eq!(cmp.common_subdirs, set(&["shared"]));
        assert_eq!(cmp.identical, set(&["same.txt"]));
        assert!(!cmp.is_in_sync());
    }

    #[test]
    fn same_size_different_mtime_is_changed() {
        let pair = TreePair::new();
        pair.source.write("f", "abc");
        pair.replica.write("f", "abc");
        pair.source.set_mtime_secs("f", 10);
        pair.replica.set_mtime_secs("f", 20);

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();
        assert_eq!(cmp.changed, set(&["f"]));
    }

    #[test]
    fn checksum_mode_ignores_mtime_and_catches_same_size_edits() {
        let pair = TreePair::new();
        pair.source.write("touched", "abc");
        pair.replica.write("touched", "abc");
        pair.source.set_mtime_secs("touched", 10);
        pair.replica.set_mtime_secs("touched", 20);
        pair.source.write("edited", "abc");
        pair.replica.write("edited", "xyz");
        pair.source.set_mtime_secs("edited", 10);
        pair.replica.set_mtime_secs("edited", 10);

        let metadata =
            compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();
        let checksum =
            compare(pair.source.root(), pair.replica.root(), CompareMode::Checksum).unwrap();

        assert_eq!(metadata.changed, set(&["touched"]));
        assert_eq!(metadata.identical, set(&["edited"]));
        assert_eq!(checksum.changed, set(&["edited"]));
        assert_eq!(checksum.identical, set(&["touched"]));
    }

    #[test]
    fn file_versus_directory_is_changed() {
        let pair = TreePair::new();
        pair.source.mkdir("thing");
        pair.replica.write("thing", "file");

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();
        assert_eq!(cmp.changed, set(&["thing"]));
        assert!(cmp.common_subdirs.is_empty());
    }

    #[test]
    fn does_not_recurse() {
        let pair = TreePair::new();
        pair.source.write("d/only_in_source.txt", "x");
        pair.replica.mkdir("d");

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();
        assert_eq!(cmp.common_subdirs, set(&["d"]));
        assert!(cmp.is_in_sync());
    }

    #[cfg(unix)]
    #[test]
    fn special_and_unreadable_source_entries_are_skipped() {
        let pair = TreePair::new();
        pair.source.write("a.txt", "a");
        std::os::unix::fs::symlink(pair.source.path("loop"), pair.source.path("loop")).unwrap();
        let _socket = std::os::unix::net::UnixListener::bind(pair.source.path("sock")).unwrap();
        pair.replica.write("loop", "kept");

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();

        assert_eq!(cmp.source_only, set(&["a.txt"]));
        let skipped: BTreeSet<_> = cmp.skipped.keys().cloned().collect();
        assert_eq!(skipped, set(&["loop", "sock"]));
        assert!(cmp.skipped[&OsString::from("sock")].contains("not a regular file"));
        assert!(cmp.replica_only.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_replica_entries_are_replaced_or_deleted() {
        let pair = TreePair::new();
        pair.source.write("shadowed.txt", "s");
        for name in ["shadowed.txt", "orphan"] {
            std::os::unix::fs::symlink(pair.replica.path(name), pair.replica.path(name)).unwrap();
        }

        let cmp = compare(pair.source.root(), pair.replica.root(), CompareMode::Metadata).unwrap();

        assert_eq!(cmp.changed, set(&["shadowed.txt"]));
        assert_eq!(cmp.replica_only, set(&["orphan"]));
        assert!(cmp.skipped.is_empty());
    }

    #[test]
    fn vanished_directory_is_reported_as_vanished() {
        let pair = TreePair::new();
        let err = compare(
            &pair.source.path("gone"),
            pair.replica.root(),
            CompareMode::Metadata,
        )
        .unwrap_err();
        assert!(err.is_vanished());
    }
}
