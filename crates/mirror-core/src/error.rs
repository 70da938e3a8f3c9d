//! Error types for mirror-core

use std::path::PathBuf;

use crate::target::Role;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sync root does not exist
    #[error("The provided directory {path} doesn't exist")]
    RootNotFound { role: Role, path: PathBuf },

    /// A sync root exists but is not a directory
    #[error("The provided {role} path {path} is not a directory")]
    NotADirectory { role: Role, path: PathBuf },

    /// Source and replica resolve to the same directory
    #[error("The source directory must be different from the replica directory.")]
    SameDirectory,

    /// One root lies inside the other
    #[error("The {inner} directory {path} must not lie inside the {outer} directory")]
    NestedRoots {
        inner: Role,
        outer: Role,
        path: PathBuf,
    },

    /// Configuration file not found at an explicitly requested path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error means an entry disappeared underneath us.
    pub fn is_vanished(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_not_found(),
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
