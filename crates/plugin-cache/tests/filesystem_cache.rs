//! Integration tests for the filesystem cache.
//!
//! Drives index generation, pruning and materialization together against
//! bundles laid out on disk.

use plugin_cache::{DirectoryBundleSource, FilesystemCacheStore, ManifestIndex};
use plugin_core::{PluginResource, Setting, SizePolicy};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to lay out a bundle directory.
fn write_bundle(root: &Path, name: &str, files: &[(&str, &[u8])]) -> String {
    let dir = root.join("bundles").join(name);
    for (path, content) in files {
        let target = dir.join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }
    dir.display().to_string()
}

/// Helper function to create a store with a fixed ceiling.
fn store(temp: &TempDir, limit: &str) -> FilesystemCacheStore {
    let setting = Arc::new(Setting::new("integration-max-size", limit));
    FilesystemCacheStore::new(temp.path().join("cache"), SizePolicy::new(setting)).unwrap()
}

#[tokio::test]
async fn test_populate_then_prune_after_version_bump() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, "1048576");
    let source = DirectoryBundleSource::new();

    let endpoint = write_bundle(
        temp.path(),
        "elemental",
        &[("package.json", b"{}".as_slice()),
            ("plugin/elemental.js", b"0123456789".as_slice()),
        ],
    );

    let v1 = PluginResource::new("ns", "elemental", "1.0.0").with_endpoint(&endpoint);
    let index = ManifestIndex::new();
    index.generate(std::slice::from_ref(&v1)).unwrap();
    store.sync_with_controllers_cache(&v1, &source).await.unwrap();

    assert_eq!(
        store.entry_files("elemental", "1.0.0").unwrap(),
        vec!["package.json", "plugin/elemental.js"]
    );

    // Version bump: next pass indexes 1.1.0, so 1.0.0 becomes an orphan
    let v2 = PluginResource::new("ns", "elemental", "1.1.0").with_endpoint(&endpoint);
    index.generate(std::slice::from_ref(&v2)).unwrap();

    let on_disk = store.list_entries("*/*").unwrap();
    let pruned = store.sync_with_index(&index, &on_disk);
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned[0].version, "1.0.0");

    store.sync_with_controllers_cache(&v2, &source).await.unwrap();

    let entries = store.list_entries("*/*").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].version, "1.1.0");
}

#[tokio::test]
async fn test_oversized_file_reported_by_directory_source() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, "16");
    let source = DirectoryBundleSource::new();

    let endpoint = write_bundle(
        temp.path(),
        "heavy",
        &[("a.js", b"small".as_slice()), ("b.js", [7u8; 32].as_slice())],
    );
    let plugin = PluginResource::new("ns", "heavy", "0.1.0").with_endpoint(endpoint);

    let err = store
        .sync_with_controllers_cache(&plugin, &source)
        .await
        .unwrap_err();
    assert!(err.is_max_file_size_exceeded());
}

#[tokio::test]
async fn test_unparsable_ceiling_uses_default() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, "thirty megabytes");
    let source = DirectoryBundleSource::new();

    let endpoint = write_bundle(temp.path(), "ok", &[("index.js", [1u8; 4096].as_slice())]);
    let plugin = PluginResource::new("ns", "ok", "1.0.0").with_endpoint(endpoint);

    store.sync_with_controllers_cache(&plugin, &source).await.unwrap();
    assert!(store.entry_path("ok", "1.0.0").join("index.js").exists());
}
