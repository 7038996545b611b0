//! Watch command implementation.
//!
//! Runs the controller with periodic resyncs until interrupted.

use super::common::{CacheArgs, build_reconciler};
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use plugin_controller::Controller;
use std::time::Duration;

/// Runs the watch command.
///
/// Every `interval` a background tick reconciles the whole resource
/// directory. On Ctrl-C the queue is drained and the last pass report is
/// printed.
pub async fn run(args: CacheArgs, interval: Duration, format: OutputFormat) -> Result<ExitCode> {
    let (store, reconciler) = build_reconciler(&args)?;

    tracing::info!(
        "Watching {} every {:?} (cache root {})",
        args.store.resources.display(),
        interval,
        reconciler.config().cache_root.display()
    );

    let controller = Controller::spawn(reconciler.clone(), store);
    let ticker = controller.run_resync(interval);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");

    ticker.abort();
    controller
        .shutdown()
        .await
        .context("controller worker failed")?;

    if let Some(report) = reconciler.last_report() {
        println!(
            "{}",
            format_output(&report, format).context("failed to format pass report")?
        );
    }

    Ok(ExitCode::Success)
}
