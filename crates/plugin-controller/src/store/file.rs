//! Directory-backed resource store.
//!
//! Each `*.json` file in the directory holds one [`PluginResource`]. Files
//! that do not end in `.json` are ignored; a `.json` file that does not
//! parse fails the listing.

use super::{Write, apply};
use async_trait::async_trait;
use plugin_core::traits::ResourceStore;
use plugin_core::{Error, PluginResource, Result, Selector};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Resource store reading and writing JSON documents in a directory.
#[derive(Debug)]
pub struct FileResourceStore {
    dir: PathBuf,
    writes: Mutex<()>,
}

impl FileResourceStore {
    /// Creates a store over `dir`. The directory is read on every call.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writes: Mutex::new(()),
        }
    }

    /// Directory holding the resource documents.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a new resource document named `<namespace>_<name>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the namespace or name is empty
    /// or contains a path separator, or an error if the document cannot be
    /// serialized or written.
    pub async fn create(&self, resource: &PluginResource) -> Result<PathBuf> {
        validate_document_part("metadata.namespace", &resource.metadata.namespace)?;
        validate_document_part("metadata.name", &resource.metadata.name)?;

        let _write = self.writes.lock().await;
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!(
            "{}_{}.json",
            resource.metadata.namespace, resource.metadata.name
        ));
        write_document(&path, resource).await?;

        Ok(path)
    }

    async fn load_all(&self) -> Result<Vec<(PathBuf, PluginResource)>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut documents = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let content = fs::read_to_string(&path).await?;
            let resource: PluginResource =
                serde_json::from_str(&content).map_err(|e| Error::SerializationError {
                    message: format!("Invalid resource document {}", path.display()),
                    source: Some(e),
                })?;
            documents.push((path, resource));
        }

        documents.sort_by(|(_, a), (_, b)| a.key().cmp(&b.key()));
        Ok(documents)
    }

    async fn write(&self, incoming: &PluginResource, write: Write) -> Result<PluginResource> {
        let _write = self.writes.lock().await;
        let key = incoming.key();

        let (path, stored) = self
            .load_all()
            .await?
            .into_iter()
            .find(|(_, stored)| stored.key() == key)
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;

        let next = apply(&stored, incoming, write)?;
        write_document(&path, &next).await?;
        tracing::debug!("Updated resource document {}", path.display());

        Ok(next)
    }
}

fn validate_document_part(field: &str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.contains(['/', '\\']) {
        "must not contain a path separator"
    } else {
        return Ok(());
    };

    Err(Error::ValidationError {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

async fn write_document(path: &Path, resource: &PluginResource) -> Result<()> {
    let json = serde_json::to_string_pretty(resource)?;
    fs::write(path, json).await?;
    Ok(())
}

#[async_trait]
impl ResourceStore for FileResourceStore {
    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<PluginResource>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .map(|(_, resource)| resource)
            .filter(|r| r.metadata.namespace == namespace && selector.matches(&r.metadata.labels))
            .collect())
    }

    async fn update(&self, resource: &PluginResource) -> Result<PluginResource> {
        self.write(resource, Write::Spec).await
    }

    async fn update_status(&self, resource: &PluginResource) -> Result<PluginResource> {
        self.write(resource, Write::Status).await
    }
}
