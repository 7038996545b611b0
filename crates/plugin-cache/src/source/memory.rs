//! In-memory bundle source.

use async_trait::async_trait;
use plugin_core::traits::BundleSource;
use plugin_core::{Error, PluginEntry, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Bundle source backed by a map of endpoint to files.
///
/// # Examples
///
/// ```
/// use plugin_cache::MemoryBundleSource;
/// use plugin_core::traits::BundleSource;
/// use plugin_core::PluginResource;
///
/// # #[tokio::main]
/// # async fn main() -> plugin_core::Result<()> {
/// let source = MemoryBundleSource::new().with_file("mem://a", "index.js", b"x".to_vec());
/// let plugin = PluginResource::new("ns", "a", "1.0.0").with_endpoint("mem://a");
///
/// assert_eq!(source.list_files(plugin.entry()).await?, vec!["index.js"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryBundleSource {
    bundles: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    fetches: AtomicUsize,
}

impl MemoryBundleSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns the source, for fixture setup.
    #[must_use]
    pub fn with_file(self, endpoint: &str, path: &str, content: Vec<u8>) -> Self {
        self.insert_file(endpoint, path, content);
        self
    }

    /// Adds or replaces a file.
    pub fn insert_file(&self, endpoint: &str, path: &str, content: Vec<u8>) {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint.to_string())
            .or_default()
            .insert(path.to_string(), content);
    }

    /// Removes a whole bundle.
    pub fn remove_bundle(&self, endpoint: &str) {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(endpoint);
    }

    /// Number of `fetch_file` calls served so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn missing(endpoint: &str, what: &str) -> Error {
        Error::SourceError {
            endpoint: endpoint.to_string(),
            message: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl BundleSource for MemoryBundleSource {
    async fn list_files(&self, entry: &PluginEntry) -> Result<Vec<String>> {
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        let files = bundles
            .get(&entry.endpoint)
            .ok_or_else(|| Self::missing(&entry.endpoint, "bundle"))?;
        Ok(files.keys().cloned().collect())
    }

    async fn fetch_file(&self, entry: &PluginEntry, path: &str, _limit: u64) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        bundles
            .get(&entry.endpoint)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| Self::missing(&entry.endpoint, path))
    }
}
