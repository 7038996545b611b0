//! Reconciler configuration.
//!
//! # Examples
//!
//! ```
//! use plugin_core::{ReconcilerConfig, Selector};
//!
//! let config = ReconcilerConfig::builder()
//!     .cache_root("/var/cache/plugins")
//!     .namespace("plugin-system")
//!     .selector(Selector::new().with("catalog", "ui"))
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.entry_pattern, "*/*");
//! ```

use crate::Selector;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Namespace plugin resources are listed from by default.
pub const DEFAULT_NAMESPACE: &str = "plugin-system";

/// Glob, relative to the cache root, that matches `name/version` entries.
pub const DEFAULT_ENTRY_PATTERN: &str = "*/*";

/// Configuration for a reconciler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReconcilerConfig {
    /// Root directory of the filesystem cache.
    ///
    /// Default: `<user cache dir>/plugin-cache`, or `./plugin-cache` when
    /// the platform has no cache directory.
    pub cache_root: PathBuf,

    /// Namespace plugin resources are listed from.
    /// Default: `plugin-system`
    pub namespace: String,

    /// Label selector applied when listing.
    /// Default: everything
    pub selector: Selector,

    /// Glob used to enumerate on-disk entries.
    /// Default: `*/*`
    pub entry_pattern: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            selector: Selector::everything(),
            entry_pattern: DEFAULT_ENTRY_PATTERN.to_string(),
        }
    }
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir().map_or_else(|| PathBuf::from("plugin-cache"), |dir| dir.join("plugin-cache"))
}

impl ReconcilerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ReconcilerConfigBuilder {
        ReconcilerConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the cache root, namespace or entry
    /// pattern is empty, or if the pattern is not two levels deep.
    pub fn validate(&self) -> Result<()> {
        if self.cache_root.as_os_str().is_empty() {
            return Err(Error::ConfigError {
                message: "Cache root path cannot be empty".to_string(),
            });
        }

        if self.namespace.trim().is_empty() {
            return Err(Error::ConfigError {
                message: "Namespace cannot be empty".to_string(),
            });
        }

        if self.entry_pattern.split('/').count() != 2 {
            return Err(Error::ConfigError {
                message: format!(
                    "Entry pattern '{}' must match name/version (two path levels)",
                    self.entry_pattern
                ),
            });
        }

        Ok(())
    }
}

/// Builder for [`ReconcilerConfig`].
#[derive(Debug)]
pub struct ReconcilerConfigBuilder {
    config: ReconcilerConfig,
}

impl ReconcilerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ReconcilerConfig::default(),
        }
    }

    /// Sets the cache root directory.
    #[must_use]
    pub fn cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_root = path.into();
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Sets the label selector.
    #[must_use]
    pub fn selector(mut self, selector: Selector) -> Self {
        self.config.selector = selector;
        self
    }

    /// Sets the on-disk entry glob.
    #[must_use]
    pub fn entry_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.entry_pattern = pattern.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ReconcilerConfig {
        self.config
    }
}

impl Default for ReconcilerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
