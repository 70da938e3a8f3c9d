//! Validated source/replica root pair

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Which side of the mirror a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Replica,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Replica => "replica",
        })
    }
}

/// The two roots being mirrored, both absolute, existing, distinct and
/// not nested in one another. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    source: PathBuf,
    replica: PathBuf,
}

impl SyncTarget {
    /// Validate and resolve a root pair.
    ///
    /// # Errors
    ///
    /// - [`Error::SameDirectory`] if both paths name the same directory
    /// - [`Error::RootNotFound`] if either path does not exist
    /// - [`Error::NotADirectory`] if either path is not a directory
    /// - [`Error::NestedRoots`] if one root lies inside the other
    pub fn new(source: impl AsRef<Path>, replica: impl AsRef<Path>) -> Result<Self> {
        let (source, replica) = (source.as_ref(), replica.as_ref());

        if source == replica {
            return Err(Error::SameDirectory);
        }

        let source = resolve(Role::Source, source)?;
        let replica = resolve(Role::Replica, replica)?;

        if source == replica {
            return Err(Error::SameDirectory);
        }
        if replica.starts_with(&source) {
            return Err(Error::NestedRoots {
                inner: Role::Replica,
                outer: Role::Source,
                path: replica,
            });
        }
        if source.starts_with(&replica) {
            return Err(Error::NestedRoots {
                inner: Role::Source,
                outer: Role::Replica,
                path: source,
            });
        }

        Ok(Self { source, replica })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }
}

fn resolve(role: Role, path: &Path) -> Result<PathBuf> {
    let resolved = dunce::canonicalize(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::RootNotFound {
            role,
            path: path.to_path_buf(),
        },
        _ => Error::Fs(mirror_fs::Error::io(path, e)),
    })?;

    if !resolved.is_dir() {
        return Err(Error::NotADirectory {
            role,
            path: resolved,
        });
    }

    Ok(resolved)
}
