//! Bundle source choosing a transport by endpoint scheme.

use super::{DirectoryBundleSource, HttpBundleSource};
use async_trait::async_trait;
use plugin_core::traits::BundleSource;
use plugin_core::{PluginEntry, Result};

/// Sends `http://` and `https://` endpoints to an [`HttpBundleSource`] and
/// everything else to a [`DirectoryBundleSource`].
///
/// # Examples
///
/// ```
/// use plugin_cache::RoutedBundleSource;
/// use plugin_core::PluginResource;
///
/// let remote = PluginResource::new("ns", "a", "1.0.0").with_endpoint("https://cdn.example.com/a");
/// let local = PluginResource::new("ns", "b", "1.0.0").with_endpoint("/srv/bundles/b");
///
/// assert!(RoutedBundleSource::is_remote(remote.entry()));
/// assert!(!RoutedBundleSource::is_remote(local.entry()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutedBundleSource {
    http: HttpBundleSource,
    directory: DirectoryBundleSource,
}

impl RoutedBundleSource {
    /// Creates a router over the given transports.
    #[must_use]
    pub const fn new(http: HttpBundleSource, directory: DirectoryBundleSource) -> Self {
        Self { http, directory }
    }

    /// Returns `true` if the entry's endpoint is fetched over HTTP.
    #[must_use]
    pub fn is_remote(entry: &PluginEntry) -> bool {
        let endpoint = entry.endpoint.trim_start();
        endpoint.starts_with("http://") || endpoint.starts_with("https://")
    }

    fn route(&self, entry: &PluginEntry) -> &dyn BundleSource {
        if Self::is_remote(entry) {
            &self.http
        } else {
            &self.directory
        }
    }
}

#[async_trait]
impl BundleSource for RoutedBundleSource {
    async fn list_files(&self, entry: &PluginEntry) -> Result<Vec<String>> {
        self.route(entry).list_files(entry).await
    }

    async fn fetch_file(&self, entry: &PluginEntry, path: &str, limit: u64) -> Result<Vec<u8>> {
        self.route(entry).fetch_file(entry, path, limit).await
    }
}
