//! Arguments and setup shared across commands.
//!
//! Configuration resolves in order: command-line flags, the TOML file given
//! with `--config`, `<config dir>/plugin-cache/config.toml` if present, then
//! built-in defaults.

use anyhow::{Context, Result, bail};
use clap::Args;
use plugin_cache::RoutedBundleSource;
use plugin_controller::{FileResourceStore, Reconciler};
use plugin_core::settings::MAX_FILE_SIZE_SETTING;
use plugin_core::{ReconcilerConfig, Selector, SizePolicy};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where resources are read from and which of them are selected.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory of `*.json` plugin resource documents
    #[arg(short, long, env = "PLUGIN_CACHE_RESOURCES")]
    pub resources: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "PLUGIN_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace to list resources from
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Label selector entries in KEY=VALUE format
    #[arg(short = 'l', long = "selector", num_args = 1)]
    pub selector: Vec<String>,
}

/// Store arguments plus the cache location and size ceiling.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Root directory of the filesystem cache
    #[arg(long, env = "PLUGIN_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Maximum size of a single cached file in bytes
    #[arg(long)]
    pub max_file_size: Option<u64>,
}

/// Parses a `KEY=VALUE` argument.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid selector format: '{s}' (expected KEY=VALUE)"),
    }
}

/// Loads a configuration file, or the default one when present.
///
/// # Errors
///
/// Returns an error if an explicitly given file is missing or either file
/// does not parse.
pub fn load_config(path: Option<&Path>) -> Result<ReconcilerConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ReconcilerConfig::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: ReconcilerConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("plugin-cache").join("config.toml"))
}

/// Resolves the configuration for commands that only read resources.
///
/// # Errors
///
/// Returns an error if loading fails or a selector is malformed.
pub fn resolve_store_config(args: &StoreArgs) -> Result<ReconcilerConfig> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(namespace) = &args.namespace {
        config.namespace.clone_from(namespace);
    }

    if !args.selector.is_empty() {
        let mut selector = Selector::new();
        for entry in &args.selector {
            let (key, value) = parse_key_value(entry)?;
            selector = selector.with(key, value);
        }
        config.selector = selector;
    }

    Ok(config)
}

/// Resolves the full configuration and applies `--max-file-size`.
///
/// # Errors
///
/// Returns an error if loading fails or the result does not validate.
pub fn resolve_config(args: &CacheArgs) -> Result<ReconcilerConfig> {
    let mut config = resolve_store_config(&args.store)?;

    if let Some(root) = &args.cache_root {
        config.cache_root.clone_from(root);
    }

    if let Some(limit) = args.max_file_size {
        MAX_FILE_SIZE_SETTING.set(limit.to_string());
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Builds the resource store and reconciler for `args`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the cache root
/// cannot be created.
pub fn build_reconciler(args: &CacheArgs) -> Result<(Arc<FileResourceStore>, Arc<Reconciler>)> {
    let config = resolve_config(args)?;
    let store = Arc::new(FileResourceStore::new(&args.store.resources));

    let reconciler = Reconciler::new(
        config,
        store.clone(),
        Arc::new(RoutedBundleSource::default()),
        SizePolicy::global(),
    )
    .context("failed to create reconciler")?;

    Ok((store, Arc::new(reconciler)))
}
