//! Plugin cache CLI.
//!
//! Keeps a filesystem cache of plugin bundles and the manifest indexes in
//! step with a directory of plugin resource documents.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `reconcile` - Run one reconciliation pass
//! - `watch` - Reconcile periodically until interrupted
//! - `index` - Print the manifest index for the current resources
//! - `entries` - List what is on disk under the cache root
//! - `completions` - Generate shell completions
//!
//! # Examples
//!
//! ```bash
//! # One pass, triggered by a specific resource
//! plugin-cache reconcile --resources ./resources --key plugin-system/elemental
//!
//! # Keep reconciling every 30 seconds
//! plugin-cache watch --resources ./resources --interval 30
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use plugin_cli::cli::{ExitCode, OutputFormat};
use plugin_cli::commands::{
    self,
    common::{CacheArgs, StoreArgs},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Plugin cache - reconcile plugin bundles into a local cache.
#[derive(Parser, Debug)]
#[command(name = "plugin-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format
    #[arg(long = "format", global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reconciliation pass.
    ///
    /// Lists every resource, rebuilds both indexes, prunes the cache and
    /// materializes every plugin that wants caching. Exits with status 1 if
    /// the pass failed.
    Reconcile {
        #[command(flatten)]
        args: CacheArgs,

        /// Resource (`namespace/name`) whose change triggers the pass
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Reconcile periodically until Ctrl-C.
    Watch {
        #[command(flatten)]
        args: CacheArgs,

        /// Seconds between passes
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Print the manifest index built from the current resources.
    Index {
        #[command(flatten)]
        args: StoreArgs,

        /// Only plugins served without authentication
        #[arg(long)]
        anonymous: bool,
    },

    /// List cache entries and totals.
    Entries {
        /// Root directory of the filesystem cache
        #[arg(long, env = "PLUGIN_CACHE_ROOT")]
        cache_root: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long, env = "PLUGIN_CACHE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    let exit_code = execute_command(cli.command, cli.format).await?;

    Ok(exit_code.into())
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Reconcile { args, key } => {
            commands::reconcile::run(args, key, output_format).await
        }
        Commands::Watch { args, interval } => {
            commands::watch::run(args, Duration::from_secs(interval), output_format).await
        }
        Commands::Index { args, anonymous } => {
            commands::index::run(args, anonymous, output_format).await
        }
        Commands::Entries { cache_root, config } => {
            commands::entries::run(cache_root, config, output_format).await
        }
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd)
        }
    }
}
