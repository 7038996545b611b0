//! Domain types for plugin resources.
//!
//! A [`PluginResource`] is the unit of declarative intent: object metadata,
//! a spec describing the plugin bundle and its caching/auth toggles, and a
//! status carrying exactly one [`CacheState`].
//!
//! # Examples
//!
//! ```
//! use plugin_core::{CacheState, PluginResource};
//!
//! let plugin = PluginResource::new("plugin-system", "elemental", "1.2.0")
//!     .with_endpoint("https://plugins.example.com/elemental/1.2.0")
//!     .with_no_auth(true);
//!
//! assert_eq!(plugin.key(), "plugin-system/elemental");
//! assert!(plugin.spec.plugin.no_auth);
//! assert_eq!(plugin.status.cache_state, CacheState::Pending);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Object metadata owned by the declarative store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name, unique within its namespace
    pub name: String,

    /// Namespace the object lives in
    pub namespace: String,

    /// Labels used by selectors
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Store-assigned version for optimistic concurrency
    #[serde(default)]
    pub resource_version: u64,
}

/// The `spec.plugin` block: bundle identity, location and policy toggles.
///
/// `name` and `version` form the cache identity and the index key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEntry {
    /// Plugin name used for indexing and as the cache directory
    pub name: String,

    /// Plugin version used for indexing and as the cache subdirectory
    pub version: String,

    /// Location the bundle files are served from
    #[serde(default)]
    pub endpoint: String,

    /// Opt out of the filesystem cache
    #[serde(default)]
    pub no_cache: bool,

    /// Serve this plugin to unauthenticated clients
    #[serde(default)]
    pub no_auth: bool,

    /// Free-form metadata passed through to the manifest index
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    /// Compression used by the endpoint, if any (e.g. `tar.gz`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_endpoint_type: Option<String>,
}

/// Desired state of a plugin resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSpec {
    /// Bundle description
    pub plugin: PluginEntry,
}

/// Cache state exported on the resource status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Caching is turned off for this resource
    Disabled,
    /// Caching requested, materialization not yet confirmed
    #[default]
    Pending,
    /// All declared files are present in the filesystem cache
    Cached,
}

impl CacheState {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Pending => "pending",
            Self::Cached => "cached",
        }
    }

    /// State a resource enters as soon as it is observed.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_core::CacheState;
    ///
    /// assert_eq!(CacheState::observed(true), CacheState::Disabled);
    /// assert_eq!(CacheState::observed(false), CacheState::Pending);
    /// ```
    #[must_use]
    pub const fn observed(no_cache: bool) -> Self {
        if no_cache { Self::Disabled } else { Self::Pending }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a plugin resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginStatus {
    /// Outcome of the last reconciliation for this resource
    #[serde(default)]
    pub cache_state: CacheState,
}

/// A declaratively specified plugin bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResource {
    /// Object metadata
    pub metadata: ObjectMeta,

    /// Desired state
    pub spec: PluginSpec,

    /// Observed state
    #[serde(default)]
    pub status: PluginStatus,
}

impl PluginResource {
    /// Creates a resource whose object name matches the plugin name.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            metadata: ObjectMeta {
                name: name.clone(),
                namespace: namespace.into(),
                ..ObjectMeta::default()
            },
            spec: PluginSpec {
                plugin: PluginEntry {
                    name,
                    version: version.into(),
                    ..PluginEntry::default()
                },
            },
            status: PluginStatus::default(),
        }
    }

    /// Sets the bundle endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.spec.plugin.endpoint = endpoint.into();
        self
    }

    /// Sets the `noCache` toggle.
    #[must_use]
    pub const fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.spec.plugin.no_cache = no_cache;
        self
    }

    /// Sets the `noAuth` toggle.
    #[must_use]
    pub const fn with_no_auth(mut self, no_auth: bool) -> Self {
        self.spec.plugin.no_auth = no_auth;
        self
    }

    /// Adds an object label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    /// Returns the `namespace/name` key used by change notifications.
    #[must_use]
    pub fn key(&self) -> String {
        resource_key(&self.metadata.namespace, &self.metadata.name)
    }

    /// Shorthand for the bundle description.
    #[must_use]
    pub const fn entry(&self) -> &PluginEntry {
        &self.spec.plugin
    }
}

/// Builds a `namespace/name` key.
#[must_use]
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Equality-based label selector.
///
/// An empty selector matches everything.
///
/// # Examples
///
/// ```
/// use plugin_core::{PluginResource, Selector};
///
/// let plugin = PluginResource::new("ns", "a", "1.0.0").with_label("tier", "core");
///
/// assert!(Selector::everything().matches(&plugin.metadata.labels));
/// assert!(Selector::new().with("tier", "core").matches(&plugin.metadata.labels));
/// assert!(!Selector::new().with("tier", "extra").matches(&plugin.metadata.labels));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(BTreeMap<String, String>);

impl Selector {
    /// Creates an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector that matches every object.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Adds a required `key=value` label.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns `true` when every required label is present with the same value.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }

    /// Returns `true` if the selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(","))
    }
}
