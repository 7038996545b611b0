//! The reconciliation pass.
//!
//! Every pass starts from a full listing of plugin resources, rebuilds both
//! manifest indexes, prunes the filesystem cache against the full index and
//! then materializes every plugin that wants caching. Nothing is carried
//! over from earlier passes except what is on disk.

use crate::error::{IndexKind, MaterializationFailure, ReconcileError, Result};
use chrono::{DateTime, Utc};
use plugin_cache::{CacheError, FilesystemCacheStore, ManifestIndex};
use plugin_core::traits::{BundleSource, ResourceStore};
use plugin_core::{CacheState, PluginResource, ReconcilerConfig, SizePolicy};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Summary of one completed pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Key of the triggering resource, `None` for a background tick
    pub trigger: Option<String>,
    /// Generation of the full index built by this pass
    pub generation: u64,
    /// Plugins in the full index
    pub indexed: usize,
    /// Plugins in the anonymous index
    pub anonymous: usize,
    /// `name@version` of every plugin materialized
    pub cached: Vec<String>,
    /// Keys of resources disabled by the size policy
    pub disabled: Vec<String>,
    /// `name@version` of every entry pruned from disk
    pub pruned: Vec<String>,
    /// Number of plugins that failed to materialize
    pub failures: usize,
    /// When the pass finished
    pub finished_at: DateTime<Utc>,
}

impl PassReport {
    /// Returns `true` if every plugin was attempted without failure.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Result of [`Reconciler::reconcile`].
///
/// `resource` carries the triggering resource with its final status even
/// when `result` is an error. The caller persists that status.
#[derive(Debug)]
pub struct PassOutcome {
    /// The triggering resource with its status updated
    pub resource: Option<PluginResource>,
    /// The pass report, or why the pass failed
    pub result: Result<PassReport>,
}

/// Keeps both manifest indexes and the filesystem cache in step with the
/// declared plugin resources.
///
/// Passes are serialized by an internal lock, so concurrent callers queue
/// up rather than racing on the cache root.
///
/// # Examples
///
/// ```no_run
/// use plugin_cache::DirectoryBundleSource;
/// use plugin_controller::{MemoryResourceStore, Reconciler};
/// use plugin_core::{PluginResource, ReconcilerConfig, SizePolicy};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryResourceStore::new());
/// store.insert(PluginResource::new("plugin-system", "elemental", "1.2.0")
///     .with_endpoint("/srv/bundles/elemental")).await;
///
/// let reconciler = Reconciler::new(
///     ReconcilerConfig::builder().cache_root("/var/cache/plugins").build(),
///     store,
///     Arc::new(DirectoryBundleSource::new()),
///     SizePolicy::global(),
/// )?;
///
/// let outcome = reconciler.reconcile("", None).await;
/// println!("{:?}", outcome.result?);
/// # Ok(())
/// # }
/// ```
pub struct Reconciler {
    config: ReconcilerConfig,
    store: Arc<dyn ResourceStore>,
    source: Arc<dyn BundleSource>,
    cache: FilesystemCacheStore,
    index: Arc<ManifestIndex>,
    anonymous_index: Arc<ManifestIndex>,
    pass_lock: Mutex<()>,
    last_report: RwLock<Option<PassReport>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("index", &self.index)
            .field("anonymous_index", &self.anonymous_index)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler, opening (and creating) the cache root.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if the configuration is invalid
    /// or [`ReconcileError::CacheRoot`] if the root cannot be created.
    pub fn new(
        config: ReconcilerConfig,
        store: Arc<dyn ResourceStore>,
        source: Arc<dyn BundleSource>,
        policy: SizePolicy,
    ) -> Result<Self> {
        config.validate().map_err(ReconcileError::Config)?;
        let cache =
            FilesystemCacheStore::new(&config.cache_root, policy).map_err(ReconcileError::CacheRoot)?;

        Ok(Self {
            config,
            store,
            source,
            cache,
            index: Arc::new(ManifestIndex::new()),
            anonymous_index: Arc::new(ManifestIndex::new()),
            pass_lock: Mutex::new(()),
            last_report: RwLock::new(None),
        })
    }

    /// Index of every listed plugin.
    #[must_use]
    pub fn index(&self) -> Arc<ManifestIndex> {
        Arc::clone(&self.index)
    }

    /// Index of the plugins served without authentication.
    #[must_use]
    pub fn anonymous_index(&self) -> Arc<ManifestIndex> {
        Arc::clone(&self.anonymous_index)
    }

    /// The filesystem cache this reconciler owns.
    #[must_use]
    pub const fn cache(&self) -> &FilesystemCacheStore {
        &self.cache
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Report of the most recent pass that got past pruning.
    #[must_use]
    pub fn last_report(&self) -> Option<PassReport> {
        self.last_report
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one full reconciliation pass.
    ///
    /// `key` names the resource whose change triggered the pass and
    /// `resource` is its latest state, or `None` when it was deleted or the
    /// pass is a background tick. Either way every listed resource is
    /// reconciled.
    pub async fn reconcile(&self, key: &str, resource: Option<PluginResource>) -> PassOutcome {
        let _pass = self.pass_lock.lock().await;
        tracing::debug!("Starting plugin reconciliation (trigger: {:?})", key);

        let mut resource = resource;
        let result = self.run_pass(key, resource.as_mut()).await;

        match &result {
            Ok(report) => tracing::info!(
                "Reconciled {} plugins: {} cached, {} disabled, {} pruned",
                report.indexed,
                report.cached.len(),
                report.disabled.len(),
                report.pruned.len()
            ),
            Err(e) => tracing::error!("Plugin reconciliation failed: {}", e),
        }

        PassOutcome { resource, result }
    }

    async fn run_pass(
        &self,
        key: &str,
        mut trigger: Option<&mut PluginResource>,
    ) -> Result<PassReport> {
        let plugins = self
            .store
            .list(&self.config.namespace, &self.config.selector)
            .await
            .map_err(|source| ReconcileError::List {
                namespace: self.config.namespace.clone(),
                source,
            })?;

        self.index
            .generate(&plugins)
            .map_err(|source| ReconcileError::Index {
                kind: IndexKind::Full,
                source,
            })?;

        let anonymous: Vec<PluginResource> = plugins
            .iter()
            .filter(|plugin| plugin.entry().no_auth)
            .cloned()
            .collect();
        self.anonymous_index
            .generate(&anonymous)
            .map_err(|source| ReconcileError::Index {
                kind: IndexKind::Anonymous,
                source,
            })?;

        let on_disk = self
            .cache
            .list_entries(&self.config.entry_pattern)
            .map_err(ReconcileError::Enumerate)?;
        let pruned = self.cache.sync_with_index(&self.index, &on_disk);

        if let Some(resource) = trigger.as_deref_mut() {
            resource.status.cache_state = CacheState::observed(resource.entry().no_cache);
        }

        let mut report = PassReport {
            trigger: trigger.as_deref().map(PluginResource::key),
            generation: self.index.snapshot().generation,
            indexed: self.index.len(),
            anonymous: self.anonymous_index.len(),
            cached: Vec::new(),
            disabled: Vec::new(),
            pruned: pruned
                .iter()
                .map(|entry| format!("{}@{}", entry.name, entry.version))
                .collect(),
            failures: 0,
            finished_at: Utc::now(),
        };

        let mut failures = Vec::new();
        let mut trigger_cached = false;

        for plugin in plugins.iter().filter(|plugin| !plugin.entry().no_cache) {
            let is_trigger = trigger
                .as_deref()
                .is_some_and(|resource| resource.key() == plugin.key());

            match self
                .cache
                .sync_with_controllers_cache(plugin, self.source.as_ref())
                .await
            {
                Ok(_) => {
                    report
                        .cached
                        .push(format!("{}@{}", plugin.entry().name, plugin.entry().version));
                    trigger_cached |= is_trigger;
                }
                Err(e) if e.is_max_file_size_exceeded() => {
                    let healed = self.disable_oversized(plugin, &e).await;
                    report.disabled.push(plugin.key());

                    match trigger.as_deref_mut() {
                        Some(resource) if is_trigger => {
                            resource.spec.plugin.no_cache = true;
                            resource.metadata.resource_version = healed.metadata.resource_version;
                            resource.status.cache_state = CacheState::Disabled;
                        }
                        _ => {
                            if let Err(e) = self.store.update_status(&healed).await {
                                tracing::warn!(
                                    "Failed to persist disabled status of {}: {}",
                                    healed.key(),
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to cache plugin {}: {}", plugin.key(), e);
                    failures.push(MaterializationFailure {
                        key: plugin.key(),
                        error: e,
                    });
                }
            }
        }

        report.failures = failures.len();
        report.finished_at = Utc::now();

        // A trigger that already opted out stays Disabled even if the
        // listing still showed it cacheable.
        if trigger_cached
            && failures.is_empty()
            && let Some(resource) = trigger
            && !resource.entry().no_cache
        {
            resource.status.cache_state = CacheState::Cached;
        }

        *self
            .last_report
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());

        if failures.is_empty() {
            tracing::debug!("Plugin reconciliation for {:?} complete", key);
            Ok(report)
        } else {
            Err(ReconcileError::Materialization(failures))
        }
    }

    /// Turns caching off for a plugin that violates the size policy.
    ///
    /// The `noCache` patch and the cache deletion are both best effort; a
    /// failure of either is logged and the next pass tries again.
    async fn disable_oversized(&self, plugin: &PluginResource, cause: &CacheError) -> PluginResource {
        tracing::error!(
            "Disabling cache for plugin {}: {}",
            plugin.key(),
            cause
        );

        let mut patched = plugin.clone();
        patched.spec.plugin.no_cache = true;

        match self.store.update(&patched).await {
            Ok(updated) => patched = updated,
            Err(e) => tracing::error!(
                "Failed to persist noCache for plugin {}: {}",
                plugin.key(),
                e
            ),
        }

        let entry = plugin.entry();
        if let Err(e) = self.cache.delete(&entry.name, &entry.version) {
            tracing::error!(
                "Failed to delete partial cache entry {}@{}: {}",
                entry.name,
                entry.version,
                e
            );
        }

        patched.status.cache_state = CacheState::Disabled;
        patched
    }
}
