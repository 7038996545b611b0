//! Collaborator traits consumed by the reconciler.
//!
//! - `store` - Declarative resource store (list, update, status update)
//! - `source` - Bundle content source (file list, file bytes)

mod source;
mod store;

pub use source::BundleSource;
pub use store::ResourceStore;
