//! Local directory bundle source.

use async_trait::async_trait;
use plugin_core::traits::BundleSource;
use plugin_core::{Error, PluginEntry, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const FILE_SCHEME: &str = "file://";

/// Reads bundles from directories on the local filesystem.
///
/// The plugin endpoint is a directory path, optionally prefixed with
/// `file://`. Relative endpoints resolve against the base directory when
/// one is configured.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBundleSource {
    base: Option<PathBuf>,
}

impl DirectoryBundleSource {
    /// Creates a source that uses endpoints as given.
    #[must_use]
    pub const fn new() -> Self {
        Self { base: None }
    }

    /// Creates a source resolving relative endpoints against `base`.
    #[must_use]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    /// Directory a plugin's bundle is read from.
    #[must_use]
    pub fn bundle_dir(&self, entry: &PluginEntry) -> PathBuf {
        let raw = entry
            .endpoint
            .strip_prefix(FILE_SCHEME)
            .unwrap_or(&entry.endpoint);
        let path = Path::new(raw);

        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn source_error(entry: &PluginEntry, message: impl std::fmt::Display) -> Error {
        Error::SourceError {
            endpoint: entry.endpoint.clone(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl BundleSource for DirectoryBundleSource {
    async fn list_files(&self, entry: &PluginEntry) -> Result<Vec<String>> {
        let dir = self.bundle_dir(entry);
        if !dir.is_dir() {
            return Err(Self::source_error(
                entry,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut files = Vec::new();
        for file in WalkDir::new(&dir).follow_links(false) {
            let file = file.map_err(|e| Self::source_error(entry, e))?;
            if !file.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = file.path().strip_prefix(&dir) {
                files.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }

        files.sort();
        Ok(files)
    }

    async fn fetch_file(&self, entry: &PluginEntry, path: &str, limit: u64) -> Result<Vec<u8>> {
        let target = self.bundle_dir(entry).join(path);

        let size = tokio::fs::metadata(&target).await?.len();
        if size > limit {
            return Err(Error::FileTooLarge {
                path: path.to_string(),
                size,
                limit,
            });
        }

        Ok(tokio::fs::read(&target).await?)
    }
}
