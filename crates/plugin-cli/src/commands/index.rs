//! Index command implementation.
//!
//! Builds a manifest index from the resource documents and prints it
//! without touching the cache.

use super::common::{StoreArgs, resolve_store_config};
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use plugin_cache::ManifestIndex;
use plugin_controller::FileResourceStore;
use plugin_core::traits::ResourceStore;

/// Runs the index command.
///
/// With `anonymous`, only plugins served without authentication are
/// indexed.
pub async fn run(args: StoreArgs, anonymous: bool, format: OutputFormat) -> Result<ExitCode> {
    let config = resolve_store_config(&args)?;
    let store = FileResourceStore::new(&args.resources);

    let mut resources = store
        .list(&config.namespace, &config.selector)
        .await
        .context("failed to read resources")?;
    if anonymous {
        resources.retain(|resource| resource.entry().no_auth);
    }

    let index = ManifestIndex::new();
    index
        .generate(&resources)
        .context("failed to generate index")?;

    let snapshot = index.snapshot();
    println!(
        "{}",
        format_output(&snapshot.entries, format).context("failed to format index")?
    );

    Ok(ExitCode::Success)
}
