//! Bundle source trait.

use crate::{PluginEntry, Result};
use async_trait::async_trait;

/// Produces the files a plugin bundle declares.
///
/// Paths are relative to the bundle root and use `/` separators.
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Lists the relative paths of every file in the bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be read.
    async fn list_files(&self, entry: &PluginEntry) -> Result<Vec<String>>;

    /// Reads one bundle file.
    ///
    /// `limit` is the active size ceiling. Sources that know a file's size
    /// before reading it should return [`crate::Error::FileTooLarge`]
    /// instead of downloading the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    async fn fetch_file(&self, entry: &PluginEntry, path: &str, limit: u64) -> Result<Vec<u8>>;
}
