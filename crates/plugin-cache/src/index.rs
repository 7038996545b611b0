//! Generation-swapped manifest index.
//!
//! A [`ManifestIndex`] maps plugin names to the metadata a serving
//! component needs to resolve a plugin's assets. Every call to
//! [`ManifestIndex::generate`] builds a complete new [`IndexGeneration`]
//! off-lock and then swaps it in, so readers holding a snapshot always see
//! one whole generation.
//!
//! # Examples
//!
//! ```
//! use plugin_cache::ManifestIndex;
//! use plugin_core::PluginResource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = ManifestIndex::new();
//! index.generate(&[
//!     PluginResource::new("ns", "elemental", "1.0.0").with_no_auth(true),
//!     PluginResource::new("ns", "kubewarden", "2.1.0"),
//! ])?;
//!
//! let snapshot = index.snapshot();
//! assert_eq!(snapshot.generation, 1);
//! assert!(index.contains("elemental", "1.0.0"));
//! assert!(!index.contains("elemental", "0.9.0"));
//! # Ok(())
//! # }
//! ```

use crate::error::IndexError;
use chrono::{DateTime, Utc};
use plugin_core::{PluginEntry, PluginResource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Servable metadata for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Plugin name
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Bundle endpoint
    pub endpoint: String,
    /// Caching disabled for this plugin
    pub no_cache: bool,
    /// Served to unauthenticated clients
    pub no_auth: bool,
    /// Free-form metadata
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Endpoint compression, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_endpoint_type: Option<String>,
}

impl From<&PluginEntry> for IndexEntry {
    fn from(entry: &PluginEntry) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            endpoint: entry.endpoint.clone(),
            no_cache: entry.no_cache,
            no_auth: entry.no_auth,
            metadata: entry.metadata.clone(),
            compressed_endpoint_type: entry.compressed_endpoint_type.clone(),
        }
    }
}

/// One complete, immutable build of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexGeneration {
    /// Monotonic generation number; 0 is the empty initial generation
    pub generation: u64,
    /// When this generation was built
    pub generated_at: DateTime<Utc>,
    /// Entries keyed by plugin name
    pub entries: BTreeMap<String, IndexEntry>,
}

impl IndexGeneration {
    fn empty() -> Self {
        Self {
            generation: 0,
            generated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Thread-safe manifest index.
///
/// Readers call [`snapshot`](Self::snapshot) and keep an `Arc` to the
/// generation they got, which stays valid while a newer one is generated.
#[derive(Debug)]
pub struct ManifestIndex {
    current: RwLock<Arc<IndexGeneration>>,
}

impl ManifestIndex {
    /// Creates an index holding the empty generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexGeneration::empty())),
        }
    }

    /// Replaces the index content with a generation built from `resources`.
    ///
    /// When several resources share a plugin name the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MissingIdentity`] if any resource has an empty
    /// plugin name or version. The previous generation stays in place.
    pub fn generate(&self, resources: &[PluginResource]) -> Result<(), IndexError> {
        let mut entries = BTreeMap::new();

        for resource in resources {
            let entry = resource.entry();
            if entry.name.trim().is_empty() {
                return Err(IndexError::MissingIdentity {
                    key: resource.key(),
                    field: "spec.plugin.name",
                });
            }
            if entry.version.trim().is_empty() {
                return Err(IndexError::MissingIdentity {
                    key: resource.key(),
                    field: "spec.plugin.version",
                });
            }

            if let Some(previous) = entries.insert(entry.name.clone(), IndexEntry::from(entry)) {
                tracing::warn!(
                    "Plugin {} declared more than once, replacing version {} with {}",
                    entry.name,
                    previous.version,
                    entry.version
                );
            }
            tracing::debug!("Indexed plugin {}@{}", entry.name, entry.version);
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = IndexGeneration {
            generation: current.generation + 1,
            generated_at: Utc::now(),
            entries,
        };
        *current = Arc::new(next);

        Ok(())
    }

    /// Returns the current generation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<IndexGeneration> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Looks up a plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<IndexEntry> {
        self.snapshot().entries.get(name).cloned()
    }

    /// Returns `true` if `name` is indexed at exactly `version`.
    #[must_use]
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.snapshot()
            .entries
            .get(name)
            .is_some_and(|entry| entry.version == version)
    }

    /// Returns `true` if `name@version` is indexed and wants caching.
    ///
    /// This is the set of `(name, version)` pairs allowed on disk.
    #[must_use]
    pub fn is_cached(&self, name: &str, version: &str) -> bool {
        self.snapshot()
            .entries
            .get(name)
            .is_some_and(|entry| entry.version == version && !entry.no_cache)
    }

    /// Indexed plugin names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.snapshot().entries.keys().cloned().collect()
    }

    /// Number of indexed plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().entries.len()
    }

    /// Returns `true` if no plugins are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().entries.is_empty()
    }

    /// Serializes the current generation's entries as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, IndexError> {
        #[derive(Serialize)]
        struct Document<'a> {
            entries: &'a BTreeMap<String, IndexEntry>,
        }

        let snapshot = self.snapshot();
        Ok(serde_json::to_string_pretty(&Document {
            entries: &snapshot.entries,
        })?)
    }
}

impl Default for ManifestIndex {
    fn default() -> Self {
        Self::new()
    }
}
