//! Bundle sources.
//!
//! - [`DirectoryBundleSource`] - bundles laid out in a local directory
//! - [`HttpBundleSource`] - bundles served over HTTP with a `files.txt` listing
//! - [`MemoryBundleSource`] - in-memory bundles for tests and demos
//! - [`RoutedBundleSource`] - picks HTTP or directory by endpoint scheme

mod directory;
mod http;
mod memory;
mod routed;

pub use directory::DirectoryBundleSource;
pub use http::{FILE_LIST_NAME, HttpBundleSource};
pub use memory::MemoryBundleSource;
pub use routed::RoutedBundleSource;
