//! Manifest index and filesystem cache for versioned plugin bundles.
//!
//! # Architecture
//!
//! Bundles are cached in a two-level directory structure:
//! ```text
//! ./plugin-cache/
//! ├── plugin-name/
//! │   └── 1.2.0/
//! │       ├── package.json
//! │       └── plugin/
//! │           └── *.js
//! ```
//!
//! - [`ManifestIndex`] - name → servable metadata, swapped one complete
//!   generation at a time
//! - [`FilesystemCacheStore`] - list, prune, materialize and delete entries
//! - [`source`] - where bundle bytes come from (directory, HTTP, memory)
//!
//! # Examples
//!
//! ```no_run
//! use plugin_cache::{DirectoryBundleSource, FilesystemCacheStore, ManifestIndex};
//! use plugin_core::{PluginResource, SizePolicy};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let plugins = vec![PluginResource::new("plugin-system", "elemental", "1.2.0")
//!     .with_endpoint("/srv/bundles/elemental")];
//!
//! let index = ManifestIndex::new();
//! index.generate(&plugins)?;
//!
//! let store = FilesystemCacheStore::new("./plugin-cache", SizePolicy::global())?;
//! let on_disk = store.list_entries("*/*")?;
//! store.sync_with_index(&index, &on_disk);
//!
//! let source = DirectoryBundleSource::new();
//! for plugin in &plugins {
//!     store.sync_with_controllers_cache(plugin, &source).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod checksum;
pub mod error;
pub mod index;
pub mod source;
pub mod store;

pub use error::{CacheError, IndexError, Result};
pub use index::{IndexEntry, IndexGeneration, ManifestIndex};
pub use source::{
    DirectoryBundleSource, HttpBundleSource, MemoryBundleSource, RoutedBundleSource,
};
pub use store::{CacheEntry, CacheStats, FilesystemCacheStore, MaterializeReport};
