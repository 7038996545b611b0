//! Reconcile command implementation.
//!
//! Runs a single reconciliation pass over a directory of resource documents
//! and prints the pass report.

use super::common::{CacheArgs, build_reconciler};
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use plugin_controller::PassReport;
use plugin_core::CacheState;
use plugin_core::traits::ResourceStore;
use serde::Serialize;

/// What the command prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutput {
    /// Triggering resource key, if one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Final cache state of the triggering resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_state: Option<CacheState>,
    /// Report of the pass, absent if it aborted early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PassReport>,
    /// Why the pass failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the reconcile command.
///
/// With `key`, the named resource triggers the pass and its resulting
/// status is written back to its document. Without it the pass runs as a
/// background tick.
///
/// Returns [`ExitCode::PassFailed`] if the pass failed.
pub async fn run(args: CacheArgs, key: Option<String>, format: OutputFormat) -> Result<ExitCode> {
    let (store, reconciler) = build_reconciler(&args)?;

    let trigger = match &key {
        Some(key) => {
            let config = reconciler.config();
            let resource = store
                .list(&config.namespace, &config.selector)
                .await
                .context("failed to read resources")?
                .into_iter()
                .find(|resource| resource.key() == *key);
            if resource.is_none() {
                tracing::warn!("Resource {} not found, running as a deletion", key);
            }
            resource
        }
        None => None,
    };

    let outcome = reconciler
        .reconcile(key.as_deref().unwrap_or_default(), trigger)
        .await;

    let mut cache_state = None;
    if let Some(resource) = &outcome.resource {
        cache_state = Some(resource.status.cache_state);
        if let Err(e) = store.update_status(resource).await {
            tracing::warn!("Failed to persist status of {}: {}", resource.key(), e);
        }
    }

    let (report, error) = match outcome.result {
        Ok(report) => (Some(report), None),
        Err(e) => {
            let report = if e.is_fatal() {
                None
            } else {
                reconciler.last_report()
            };
            (report, Some(e.to_string()))
        }
    };
    let exit_code = if error.is_some() {
        ExitCode::PassFailed
    } else {
        ExitCode::Success
    };

    let output = ReconcileOutput {
        key,
        cache_state,
        report,
        error,
    };
    println!(
        "{}",
        format_output(&output, format).context("failed to format pass report")?
    );

    Ok(exit_code)
}
