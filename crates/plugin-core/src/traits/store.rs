//! Declarative resource store trait.

use crate::{PluginResource, Result, Selector};
use async_trait::async_trait;

/// Read-through view of the declarative store plus its write interface.
///
/// Implementations must be `Send + Sync`; the reconciler holds them behind
/// an `Arc` and calls them from a Tokio worker.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use plugin_core::traits::ResourceStore;
/// use plugin_core::{PluginResource, Result, Selector};
///
/// struct Empty;
///
/// #[async_trait]
/// impl ResourceStore for Empty {
///     async fn list(&self, _ns: &str, _selector: &Selector) -> Result<Vec<PluginResource>> {
///         Ok(Vec::new())
///     }
///
///     async fn update(&self, resource: &PluginResource) -> Result<PluginResource> {
///         Ok(resource.clone())
///     }
///
///     async fn update_status(&self, resource: &PluginResource) -> Result<PluginResource> {
///         Ok(resource.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Lists resources in `namespace` matching `selector`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<PluginResource>>;

    /// Persists metadata and spec changes. Status is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Conflict`] if `resource_version` is stale,
    /// [`crate::Error::NotFound`] if the resource is gone.
    async fn update(&self, resource: &PluginResource) -> Result<PluginResource>;

    /// Persists the status only.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResourceStore::update`].
    async fn update_status(&self, resource: &PluginResource) -> Result<PluginResource>;
}
