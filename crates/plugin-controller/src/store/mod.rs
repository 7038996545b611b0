//! [`ResourceStore`](plugin_core::traits::ResourceStore) implementations.
//!
//! - `memory` - In-process store with failure injection
//! - `file` - One JSON document per resource in a directory
//!
//! Both apply the same optimistic concurrency rule: a write must carry the
//! stored `resourceVersion`, and every accepted write bumps it by one.

mod file;
mod memory;

pub use file::FileResourceStore;
pub use memory::MemoryResourceStore;

use plugin_core::{Error, PluginResource, Result};

/// Which half of a resource a write replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    Spec,
    Status,
}

/// Applies `incoming` to `stored` and returns the new stored state.
fn apply(stored: &PluginResource, incoming: &PluginResource, write: Write) -> Result<PluginResource> {
    if incoming.metadata.resource_version != stored.metadata.resource_version {
        return Err(Error::Conflict {
            key: stored.key(),
            expected: incoming.metadata.resource_version,
            actual: stored.metadata.resource_version,
        });
    }

    let mut next = stored.clone();
    match write {
        Write::Spec => {
            next.metadata.labels.clone_from(&incoming.metadata.labels);
            next.spec = incoming.spec.clone();
        }
        Write::Status => next.status = incoming.status.clone(),
    }
    next.metadata.resource_version += 1;

    Ok(next)
}
