//! End-to-end reconciliation passes against an in-memory store and bundle
//! source with a real cache directory.

use plugin_cache::MemoryBundleSource;
use plugin_controller::{IndexKind, MemoryResourceStore, ReconcileError, Reconciler};
use plugin_core::traits::ResourceStore;
use plugin_core::{CacheState, PluginResource, ReconcilerConfig, Setting, SizePolicy};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

const NAMESPACE: &str = "plugin-system";

struct Harness {
    _temp: TempDir,
    store: Arc<MemoryResourceStore>,
    source: Arc<MemoryBundleSource>,
    reconciler: Reconciler,
}

/// Helper function to build a reconciler with the given size ceiling.
fn harness(limit: &str) -> Harness {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MemoryResourceStore::new());
    let source = Arc::new(MemoryBundleSource::new());
    let setting = Arc::new(Setting::new("scenario-max-size", limit));

    let config = ReconcilerConfig::builder()
        .cache_root(temp.path().join("cache"))
        .namespace(NAMESPACE)
        .build();
    let reconciler = Reconciler::new(
        config,
        store.clone(),
        source.clone(),
        SizePolicy::new(setting),
    )
    .unwrap();

    Harness {
        _temp: temp,
        store,
        source,
        reconciler,
    }
}

impl Harness {
    /// Stores a plugin whose bundle holds one file of `size` bytes.
    async fn add(&self, name: &str, version: &str, size: usize) -> PluginResource {
        self.add_resource(PluginResource::new(NAMESPACE, name, version), size)
            .await
    }

    async fn add_resource(&self, resource: PluginResource, size: usize) -> PluginResource {
        let entry = resource.entry();
        let endpoint = format!("mem://{}/{}", entry.name, entry.version);
        self.source
            .insert_file(&endpoint, "plugin/index.js", vec![b'x'; size]);

        let resource = resource.with_endpoint(endpoint);
        self.store.insert(resource.clone()).await;
        resource
    }

    async fn current(&self, name: &str) -> PluginResource {
        self.store
            .get(&format!("{NAMESPACE}/{name}"))
            .await
            .unwrap()
    }

    fn on_disk(&self) -> BTreeSet<(String, String)> {
        self.reconciler
            .cache()
            .list_entries("*/*")
            .unwrap()
            .into_iter()
            .map(|entry| (entry.name, entry.version))
            .collect()
    }
}

fn pair(name: &str, version: &str) -> (String, String) {
    (name.to_string(), version.to_string())
}

#[tokio::test]
async fn test_empty_resource_list() {
    let h = harness("1048576");

    let outcome = h.reconciler.reconcile("", None).await;
    let report = outcome.result.unwrap();

    assert!(outcome.resource.is_none());
    assert!(h.reconciler.index().is_empty());
    assert!(h.reconciler.anonymous_index().is_empty());
    assert!(h.on_disk().is_empty());
    assert_eq!(report.indexed, 0);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_single_plugin_becomes_cached() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 10).await;

    let trigger = h.current("a").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    let report = outcome.result.unwrap();
    let resource = outcome.resource.unwrap();
    assert_eq!(resource.status.cache_state, CacheState::Cached);
    assert_eq!(report.cached, vec!["a@1.0.0"]);

    let file = h
        .reconciler
        .cache()
        .entry_path("a", "1.0.0")
        .join("plugin/index.js");
    assert_eq!(std::fs::metadata(file).unwrap().len(), 10);
}

#[tokio::test]
async fn test_anonymous_index_holds_no_auth_plugins_only() {
    let h = harness("1048576");
    h.add_resource(
        PluginResource::new(NAMESPACE, "b", "1.0.0").with_no_auth(true),
        4,
    )
    .await;
    h.add("c", "1.0.0", 4).await;

    h.reconciler.reconcile("", None).await.result.unwrap();

    assert_eq!(h.reconciler.index().names(), vec!["b", "c"]);
    assert_eq!(h.reconciler.anonymous_index().names(), vec!["b"]);
}

#[tokio::test]
async fn test_deleted_resource_is_pruned_on_next_pass() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;
    h.add("d", "0.3.0", 4).await;

    h.reconciler.reconcile("", None).await.result.unwrap();
    assert!(h.on_disk().contains(&pair("d", "0.3.0")));

    h.store.remove(&format!("{NAMESPACE}/d")).await;
    let key = format!("{NAMESPACE}/a");
    let trigger = h.current("a").await;
    let report = h
        .reconciler
        .reconcile(&key, Some(trigger))
        .await
        .result
        .unwrap();

    assert_eq!(report.pruned, vec!["d@0.3.0"]);
    assert_eq!(h.on_disk(), BTreeSet::from([pair("a", "1.0.0")]));
    assert!(!h.reconciler.cache().root().join("d").exists());
}

#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;
    h.add_resource(
        PluginResource::new(NAMESPACE, "b", "2.0.0").with_no_auth(true),
        8,
    )
    .await;
    h.add_resource(
        PluginResource::new(NAMESPACE, "c", "3.0.0").with_no_cache(true),
        8,
    )
    .await;

    h.reconciler.reconcile("", None).await.result.unwrap();
    let first_disk = h.on_disk();
    let first_index = h.reconciler.index().snapshot();
    let first_anonymous = h.reconciler.anonymous_index().snapshot();

    let second = h.reconciler.reconcile("", None).await.result.unwrap();

    assert_eq!(h.on_disk(), first_disk);
    assert_eq!(h.reconciler.index().snapshot().entries, first_index.entries);
    assert_eq!(
        h.reconciler.anonymous_index().snapshot().entries,
        first_anonymous.entries
    );
    assert!(second.pruned.is_empty());
    assert_eq!(second.generation, first_index.generation + 1);
}

#[tokio::test]
async fn test_anonymous_index_is_subset_of_full_index() {
    let h = harness("1048576");
    for (i, no_auth) in [true, false, true, false, false].into_iter().enumerate() {
        h.add_resource(
            PluginResource::new(NAMESPACE, format!("p{i}"), "1.0.0").with_no_auth(no_auth),
            2,
        )
        .await;
    }

    h.reconciler.reconcile("", None).await.result.unwrap();

    let full = h.reconciler.index().snapshot();
    let anonymous = h.reconciler.anonymous_index().snapshot();
    assert_eq!(anonymous.entries.len(), 2);
    for (name, entry) in &anonymous.entries {
        assert!(full.entries.contains_key(name));
        assert!(entry.no_auth);
    }
}

#[tokio::test]
async fn test_disk_matches_cacheable_resources_minus_self_healed() {
    let h = harness("64");
    h.add("a", "1.0.0", 10).await;
    h.add_resource(
        PluginResource::new(NAMESPACE, "b", "1.0.0").with_no_cache(true),
        10,
    )
    .await;
    h.add("c", "1.0.0", 65).await;

    let report = h.reconciler.reconcile("", None).await.result.unwrap();

    assert_eq!(h.on_disk(), BTreeSet::from([pair("a", "1.0.0")]));
    assert_eq!(report.disabled, vec![format!("{NAMESPACE}/c")]);
}

#[tokio::test]
async fn test_oversized_trigger_self_heals() {
    let h = harness("16");
    h.add("heavy", "1.0.0", 17).await;

    let trigger = h.current("heavy").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    assert!(outcome.result.is_ok());
    let resource = outcome.resource.unwrap();
    assert!(resource.spec.plugin.no_cache);
    assert_eq!(resource.status.cache_state, CacheState::Disabled);

    let stored = h.current("heavy").await;
    assert!(stored.spec.plugin.no_cache);
    assert_eq!(
        stored.metadata.resource_version,
        resource.metadata.resource_version
    );
    assert!(h.on_disk().is_empty());
    assert!(!h.reconciler.cache().entry_path("heavy", "1.0.0").exists());
}

#[tokio::test]
async fn test_file_exactly_at_ceiling_is_cached() {
    let h = harness("16");
    h.add("edge", "1.0.0", 16).await;

    let trigger = h.current("edge").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    assert!(outcome.result.is_ok());
    assert_eq!(
        outcome.resource.unwrap().status.cache_state,
        CacheState::Cached
    );
}

#[tokio::test]
async fn test_self_heal_survives_failed_patch() {
    let h = harness("16");
    h.add("heavy", "1.0.0", 32).await;
    h.store.fail_updates(true);

    let trigger = h.current("heavy").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    assert!(outcome.result.is_ok());
    assert_eq!(
        outcome.resource.unwrap().status.cache_state,
        CacheState::Disabled
    );
    assert!(h.on_disk().is_empty());
    assert!(!h.current("heavy").await.spec.plugin.no_cache);
}

#[tokio::test]
async fn test_self_heal_of_bystander_persists_status() {
    let h = harness("16");
    h.add("small", "1.0.0", 4).await;
    h.add("heavy", "1.0.0", 32).await;

    let trigger = h.current("small").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    assert_eq!(
        outcome.resource.unwrap().status.cache_state,
        CacheState::Cached
    );

    let heavy = h.current("heavy").await;
    assert!(heavy.spec.plugin.no_cache);
    assert_eq!(heavy.status.cache_state, CacheState::Disabled);
    assert_eq!(heavy.metadata.resource_version, 2);
}

#[tokio::test]
async fn test_no_cache_plugin_is_never_materialized() {
    let h = harness("1048576");
    h.add_resource(
        PluginResource::new(NAMESPACE, "off", "1.0.0").with_no_cache(true),
        10,
    )
    .await;

    let trigger = h.current("off").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    assert!(outcome.result.is_ok());
    assert_eq!(
        outcome.resource.unwrap().status.cache_state,
        CacheState::Disabled
    );
    assert!(h.on_disk().is_empty());
    assert_eq!(h.source.fetch_count(), 0);
    assert!(h.reconciler.index().contains("off", "1.0.0"));
}

#[tokio::test]
async fn test_turning_cache_off_prunes_existing_entry() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;
    h.reconciler.reconcile("", None).await.result.unwrap();
    assert_eq!(h.on_disk().len(), 1);

    let current = h.current("a").await;
    h.store.update(&current.with_no_cache(true)).await.unwrap();

    let report = h.reconciler.reconcile("", None).await.result.unwrap();
    assert_eq!(report.pruned, vec!["a@1.0.0"]);
    assert!(h.on_disk().is_empty());
}

#[tokio::test]
async fn test_opted_out_trigger_is_not_reported_cached_from_stale_listing() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;

    // The listing still says cacheable, the trigger already opted out
    let trigger = h.current("a").await.with_no_cache(true);
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    outcome.result.unwrap();
    let resource = outcome.resource.unwrap();
    assert!(resource.spec.plugin.no_cache);
    assert_eq!(resource.status.cache_state, CacheState::Disabled);
}

#[tokio::test]
async fn test_list_failure_aborts_pass() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;
    h.reconciler.reconcile("", None).await.result.unwrap();
    let generation = h.reconciler.index().snapshot().generation;

    h.store.fail_list(true);
    let mut trigger = h.current("a").await;
    trigger.status.cache_state = CacheState::Cached;
    let outcome = h
        .reconciler
        .reconcile(&trigger.key(), Some(trigger.clone()))
        .await;

    let err = outcome.result.unwrap_err();
    assert!(matches!(err, ReconcileError::List { .. }));
    assert!(err.is_fatal());
    assert_eq!(outcome.resource, Some(trigger));
    assert_eq!(h.reconciler.index().snapshot().generation, generation);
    assert_eq!(h.on_disk().len(), 1);
}

#[tokio::test]
async fn test_missing_identity_aborts_pass() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;
    h.store
        .insert(PluginResource::new(NAMESPACE, "broken", ""))
        .await;

    let err = h.reconciler.reconcile("", None).await.result.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Index {
            kind: IndexKind::Full,
            ..
        }
    ));
    assert!(h.on_disk().is_empty());
    assert!(h.reconciler.last_report().is_none());
}

#[tokio::test]
async fn test_source_failure_is_accumulated() {
    let h = harness("1048576");
    h.store
        .insert(PluginResource::new(NAMESPACE, "missing", "1.0.0").with_endpoint("mem://nowhere"))
        .await;
    h.add("fine", "1.0.0", 4).await;

    let trigger = h.current("fine").await;
    let outcome = h.reconciler.reconcile(&trigger.key(), Some(trigger)).await;

    let err = outcome.result.unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(err.failure_count(), 1);
    assert!(err.to_string().contains("plugin-system/missing"));

    // The healthy plugin is still cached, but the trigger is not reported
    // Cached while the pass as a whole failed
    assert_eq!(h.on_disk(), BTreeSet::from([pair("fine", "1.0.0")]));
    assert_eq!(
        outcome.resource.unwrap().status.cache_state,
        CacheState::Pending
    );

    let report = h.reconciler.last_report().unwrap();
    assert_eq!(report.failures, 1);
    assert_eq!(report.cached, vec!["fine@1.0.0"]);
}

#[tokio::test]
async fn test_deleted_trigger_still_runs_full_pass() {
    let h = harness("1048576");
    h.add("a", "1.0.0", 4).await;

    let outcome = h
        .reconciler
        .reconcile(&format!("{NAMESPACE}/gone"), None)
        .await;

    assert!(outcome.resource.is_none());
    let report = outcome.result.unwrap();
    assert!(report.trigger.is_none());
    assert_eq!(report.cached, vec!["a@1.0.0"]);
}

#[tokio::test]
async fn test_concurrent_passes_are_serialized() {
    let h = harness("1048576");
    for i in 0..5 {
        h.add(&format!("p{i}"), "1.0.0", 64).await;
    }

    let (first, second) = tokio::join!(
        h.reconciler.reconcile("", None),
        h.reconciler.reconcile("", None)
    );

    let first = first.result.unwrap();
    let second = second.result.unwrap();
    assert_ne!(first.generation, second.generation);
    assert_eq!(h.on_disk().len(), 5);
}
