//! Blake3 checksum helpers.
//!
//! Materialization compares the checksum of fetched content with the file
//! already on disk and skips the write when they match, so repeated passes
//! over an unchanged bundle leave the cache untouched. Checksums use the
//! `"blake3:<hex>"` format.

use std::fs;
use std::io;
use std::path::Path;

const CHECKSUM_PREFIX: &str = "blake3:";

/// Calculates the Blake3 checksum for the given data.
///
/// # Examples
///
/// ```
/// use plugin_cache::checksum::calculate_checksum;
///
/// let checksum = calculate_checksum(b"Hello, world!");
///
/// assert!(checksum.starts_with("blake3:"));
/// assert_eq!(checksum.len(), 71); // "blake3:" + 64 hex chars
/// ```
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("{CHECKSUM_PREFIX}{}", hash.to_hex())
}

/// Returns `true` if the file at `path` holds exactly `content`.
///
/// A missing file is reported as a mismatch rather than an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn file_matches(path: &Path, content: &[u8]) -> io::Result<bool> {
    let existing = match fs::read(path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if existing.len() != content.len() {
        return Ok(false);
    }

    Ok(calculate_checksum(&existing) == calculate_checksum(content))
}
