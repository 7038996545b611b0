//! In-process resource store.

use super::{Write, apply};
use async_trait::async_trait;
use plugin_core::traits::ResourceStore;
use plugin_core::{Error, PluginResource, Result, Selector};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Resource store held entirely in memory.
///
/// Used by tests and demos. Listing and writes can be made to fail on
/// demand to exercise the reconciler's error paths.
///
/// # Examples
///
/// ```
/// use plugin_controller::MemoryResourceStore;
/// use plugin_core::traits::ResourceStore;
/// use plugin_core::{PluginResource, Selector};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryResourceStore::new();
/// store.insert(PluginResource::new("ns", "a", "1.0.0")).await;
///
/// let listed = store.list("ns", &Selector::everything()).await?;
/// assert_eq!(listed.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: RwLock<BTreeMap<String, PluginResource>>,
    fail_list: AtomicBool,
    fail_updates: AtomicBool,
    updates: AtomicUsize,
}

impl MemoryResourceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a resource as-is, bypassing version checks.
    pub async fn insert(&self, resource: PluginResource) {
        self.resources
            .write()
            .await
            .insert(resource.key(), resource);
    }

    /// Removes a resource. Returns it if it existed.
    pub async fn remove(&self, key: &str) -> Option<PluginResource> {
        self.resources.write().await.remove(key)
    }

    /// Returns the stored state of a resource.
    pub async fn get(&self, key: &str) -> Option<PluginResource> {
        self.resources.read().await.get(key).cloned()
    }

    /// Number of stored resources.
    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }

    /// Makes [`ResourceStore::list`] fail until reset.
    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail until reset.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of write attempts, failed ones included.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    async fn write(&self, incoming: &PluginResource, write: Write) -> Result<PluginResource> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::SourceError {
                endpoint: "memory".to_string(),
                message: format!("write to {} rejected", incoming.key()),
            });
        }

        let key = incoming.key();
        let mut resources = self.resources.write().await;
        let stored = resources
            .get(&key)
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;

        let next = apply(stored, incoming, write)?;
        resources.insert(key, next.clone());
        Ok(next)
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<PluginResource>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::SourceError {
                endpoint: "memory".to_string(),
                message: "list rejected".to_string(),
            });
        }

        Ok(self
            .resources
            .read()
            .await
            .values()
            .filter(|r| r.metadata.namespace == namespace && selector.matches(&r.metadata.labels))
            .cloned()
            .collect())
    }

    async fn update(&self, resource: &PluginResource) -> Result<PluginResource> {
        self.write(resource, Write::Spec).await
    }

    async fn update_status(&self, resource: &PluginResource) -> Result<PluginResource> {
        self.write(resource, Write::Status).await
    }
}
