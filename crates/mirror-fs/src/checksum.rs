//! SHA-256 checksum utilities
//!
//! Backs the content comparison mode. Checksums use the canonical
//! `sha256:<hex>` format.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a file's contents, streaming it from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(path, e))?;
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}
