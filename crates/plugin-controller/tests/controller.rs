//! Tests for notification dispatch through the controller worker.

use plugin_cache::MemoryBundleSource;
use plugin_controller::{Controller, MemoryResourceStore, Notification, Reconciler};
use plugin_core::traits::ResourceStore;
use plugin_core::{CacheState, PluginResource, ReconcilerConfig, Setting, SizePolicy};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Helper function to create a reconciler over shared memory collaborators.
fn setup(
    temp: &TempDir,
) -> (
    Arc<MemoryResourceStore>,
    Arc<MemoryBundleSource>,
    Arc<Reconciler>,
) {
    let store = Arc::new(MemoryResourceStore::new());
    let source = Arc::new(MemoryBundleSource::new());
    let config = ReconcilerConfig::builder()
        .cache_root(temp.path())
        .namespace("ns")
        .build();
    let policy = SizePolicy::new(Arc::new(Setting::new("controller-max-size", "1024")));

    let reconciler = Reconciler::new(config, store.clone(), source.clone(), policy).unwrap();
    (store, source, Arc::new(reconciler))
}

async fn add(
    store: &MemoryResourceStore,
    source: &MemoryBundleSource,
    name: &str,
    size: usize,
) -> PluginResource {
    let endpoint = format!("mem://{name}");
    source.insert_file(&endpoint, "index.js", vec![0; size]);
    let resource = PluginResource::new("ns", name, "1.0.0").with_endpoint(endpoint);
    store.insert(resource.clone()).await;
    resource
}

#[tokio::test]
async fn test_notification_persists_status() {
    let temp = TempDir::new().unwrap();
    let (store, source, reconciler) = setup(&temp);
    let resource = add(&store, &source, "a", 8).await;

    let controller = Controller::spawn(Arc::clone(&reconciler), store.clone());
    controller.notify(Notification::changed(resource)).unwrap();
    controller.shutdown().await.unwrap();

    let stored = store.get("ns/a").await.unwrap();
    assert_eq!(stored.status.cache_state, CacheState::Cached);
    assert!(reconciler.cache().entry_path("a", "1.0.0").exists());
}

#[tokio::test]
async fn test_oversized_notification_persists_disabled() {
    let temp = TempDir::new().unwrap();
    let (store, source, reconciler) = setup(&temp);
    let resource = add(&store, &source, "heavy", 2048).await;

    let controller = Controller::spawn(Arc::clone(&reconciler), store.clone());
    controller.notify(Notification::changed(resource)).unwrap();
    controller.shutdown().await.unwrap();

    let stored = store.get("ns/heavy").await.unwrap();
    assert!(stored.spec.plugin.no_cache);
    assert_eq!(stored.status.cache_state, CacheState::Disabled);
}

#[tokio::test]
async fn test_status_persisted_even_when_pass_fails() {
    let temp = TempDir::new().unwrap();
    let (store, source, reconciler) = setup(&temp);
    let resource = add(&store, &source, "a", 8).await;
    store
        .insert(PluginResource::new("ns", "b", "1.0.0").with_endpoint("mem://missing"))
        .await;

    let mut stale = resource.clone();
    stale.status.cache_state = CacheState::Cached;
    store.update_status(&stale).await.unwrap();

    let controller = Controller::spawn(Arc::clone(&reconciler), store.clone());
    let current = store.get("ns/a").await.unwrap();
    controller.notify(Notification::changed(current)).unwrap();
    controller.shutdown().await.unwrap();

    // The pass failed on b, so a goes back to Pending rather than keeping
    // a Cached it cannot vouch for
    let stored = store.get("ns/a").await.unwrap();
    assert_eq!(stored.status.cache_state, CacheState::Pending);
    assert_eq!(reconciler.last_report().unwrap().failures, 1);
}

#[tokio::test]
async fn test_removal_notification_prunes() {
    let temp = TempDir::new().unwrap();
    let (store, source, reconciler) = setup(&temp);
    add(&store, &source, "a", 8).await;

    let controller = Controller::spawn(Arc::clone(&reconciler), store.clone());
    controller.resync().unwrap();
    store.remove("ns/a").await;
    controller.notify(Notification::removed("ns/a")).unwrap();
    controller.shutdown().await.unwrap();

    assert!(reconciler.cache().list_entries("*/*").unwrap().is_empty());
    assert_eq!(store.update_count(), 0);
}

#[tokio::test]
async fn test_periodic_resync() {
    let temp = TempDir::new().unwrap();
    let (store, source, reconciler) = setup(&temp);
    add(&store, &source, "a", 8).await;

    let controller = Controller::spawn(Arc::clone(&reconciler), store.clone());
    let ticker = controller.run_resync(Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(60)).await;
    ticker.abort();
    controller.shutdown().await.unwrap();

    let report = reconciler.last_report().unwrap();
    assert!(report.generation >= 2);
    assert!(report.trigger.is_none());
}

#[tokio::test]
async fn test_tick_notification_has_no_resource() {
    let tick = Notification::tick();
    assert!(tick.key.is_empty());
    assert!(tick.resource.is_none());

    let removed = Notification::removed("ns/a");
    assert_eq!(removed.key, "ns/a");
    assert!(removed.resource.is_none());
}
