//! Entries command implementation.
//!
//! Lists the `name/version` entries under the cache root with totals.

use super::common::load_config;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use plugin_cache::{CacheStats, FilesystemCacheStore};
use plugin_core::SizePolicy;
use serde::Serialize;
use std::path::PathBuf;

/// One listed entry.
#[derive(Debug, Serialize)]
pub struct EntryRow {
    /// Plugin name
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Files in the entry
    pub files: usize,
}

/// What the command prints.
#[derive(Debug, Serialize)]
pub struct EntriesOutput {
    /// Cache root that was listed
    pub root: PathBuf,
    /// Entries in name order
    pub entries: Vec<EntryRow>,
    /// Totals
    pub stats: CacheStats,
}

/// Runs the entries command.
pub async fn run(
    cache_root: Option<PathBuf>,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = load_config(config.as_deref())?;
    let root = cache_root.unwrap_or(config.cache_root);

    let store = FilesystemCacheStore::new(&root, SizePolicy::global())
        .with_context(|| format!("failed to open cache root {}", root.display()))?;

    let mut entries = Vec::new();
    for entry in store
        .list_entries(&config.entry_pattern)
        .context("failed to list cache entries")?
    {
        let files = store.entry_files(&entry.name, &entry.version)?.len();
        entries.push(EntryRow {
            name: entry.name,
            version: entry.version,
            files,
        });
    }

    let output = EntriesOutput {
        stats: store.stats().context("failed to compute cache stats")?,
        root,
        entries,
    };
    println!(
        "{}",
        format_output(&output, format).context("failed to format entries")?
    );

    Ok(ExitCode::Success)
}
