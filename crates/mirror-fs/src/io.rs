//! Copy, replace and remove operations for mirrored entries

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::listing::EntryKind;
use crate::{Error, Result};

/// Counts of entries written by [`copy_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    /// FIFOs, sockets and devices left out of the copy.
    pub skipped: usize,
}

/// Kind of the entry at `path`, following symlinks.
pub fn entry_kind(path: &Path) -> Result<EntryKind> {
    let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    Ok(EntryKind::from_metadata(&meta))
}

/// Copy the content of `src` to `dst`, carrying over the source's
/// modification time and permissions.
///
/// `dst` is created or truncated. Returns the number of bytes copied.
/// A `src` that is not a regular file yields [`Error::SpecialFile`] without
/// being opened.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if entry_kind(src)? != EntryKind::File {
        return Err(Error::SpecialFile {
            path: src.to_path_buf(),
        });
    }

    let mut reader = File::open(src).map_err(|e| Error::io(src, e))?;
    let meta = reader.metadata().map_err(|e| Error::io(src, e))?;

    let mut writer = File::create(dst).map_err(|e| Error::io(dst, e))?;
    let bytes = std::io::copy(&mut reader, &mut writer).map_err(|e| Error::io(dst, e))?;

    // The handle is still writable here, so this works for read-only sources.
    if let Ok(modified) = meta.modified() {
        writer.set_modified(modified).map_err(|e| Error::io(dst, e))?;
    }
    drop(writer);

    fs::set_permissions(dst, meta.permissions()).map_err(|e| Error::io(dst, e))?;
    Ok(bytes)
}

/// Overwrite `dst` with the content of `src` without exposing a partially
/// written file.
///
/// Writes to a sibling temp file (same filesystem) and renames it over `dst`.
pub fn replace_file(src: &Path, dst: &Path) -> Result<u64> {
    let temp_path = temp_sibling(dst);

    let bytes = match copy_file(src, &temp_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&temp_path, dst) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(dst, e));
    }

    Ok(bytes)
}

/// Recursively copy the directory `src` to `dst`.
///
/// `dst` may already exist. Children that vanish while the copy is running
/// are skipped rather than failing the whole subtree. Special files are
/// left out and counted in [`CopyStats::skipped`].
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    copy_tree_into(src, dst, &mut stats)?;
    Ok(stats)
}

fn copy_tree_into(src: &Path, dst: &Path, stats: &mut CopyStats) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;
    stats.dirs += 1;

    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        let result = entry_kind(&from).and_then(|kind| match kind {
            EntryKind::Dir => copy_tree_into(&from, &to, stats),
            EntryKind::File => copy_file(&from, &to).map(|_| stats.files += 1),
            EntryKind::Special => {
                tracing::warn!(path = %from.display(), "Skipping special file");
                stats.skipped += 1;
                Ok(())
            }
        });

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %from.display(), "Entry vanished during tree copy");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Remove the entry at `path`: recursively for directories, the link itself
/// for symlinks. Returns the kind that was removed.
pub fn remove_entry(path: &Path) -> Result<EntryKind> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;

    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
        Ok(EntryKind::Dir)
    } else {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        Ok(EntryKind::File)
    }
}

/// Open `path` for appending, creating it if needed. Never truncates.
pub fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))
}

/// Append one line to `file` under an exclusive advisory lock.
///
/// `path` is only used for error reporting.
pub fn append_line(file: &mut File, path: &Path, line: &str) -> Result<()> {
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let written = file
        .write_all(line.as_bytes())
        .and_then(|()| {
            if line.ends_with('\n') {
                Ok(())
            } else {
                file.write_all(b"\n")
            }
        })
        .and_then(|()| file.flush());

    file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    written.map_err(|e| Error::io(path, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}
