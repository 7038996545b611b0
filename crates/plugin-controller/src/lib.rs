//! Reconciliation of plugin resources into manifest indexes and the
//! filesystem bundle cache.
//!
//! # Architecture
//!
//! - [`Reconciler`] - one full pass: list, index, prune, materialize,
//!   report status
//! - [`Controller`] - single worker serializing change notifications
//! - [`MemoryResourceStore`] / [`FileResourceStore`] - resource stores for
//!   tests and the CLI
//!
//! # Examples
//!
//! ```no_run
//! use plugin_cache::DirectoryBundleSource;
//! use plugin_controller::{Controller, FileResourceStore, Notification, Reconciler};
//! use plugin_core::{ReconcilerConfig, SizePolicy};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileResourceStore::new("./resources"));
//! let reconciler = Arc::new(Reconciler::new(
//!     ReconcilerConfig::default(),
//!     store.clone(),
//!     Arc::new(DirectoryBundleSource::new()),
//!     SizePolicy::global(),
//! )?);
//!
//! let controller = Controller::spawn(reconciler, store);
//! controller.notify(Notification::removed("plugin-system/old-plugin"))?;
//! let ticker = controller.run_resync(Duration::from_secs(60));
//!
//! ticker.abort();
//! controller.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod controller;
mod error;
mod reconciler;
mod store;

pub use controller::{Controller, ControllerHandle, Notification};
pub use error::{IndexKind, MaterializationFailure, ReconcileError, Result};
pub use reconciler::{PassOutcome, PassReport, Reconciler};
pub use store::{FileResourceStore, MemoryResourceStore};
