//! Dynamic process-wide settings and the file size policy.
//!
//! Settings are string-encoded, as operators edit them at runtime. Each one
//! resolves in order: runtime override, `PLUGIN_CACHE_<NAME>` environment
//! variable, compiled-in default.
//!
//! # Examples
//!
//! ```
//! use plugin_core::settings::{Setting, SizePolicy};
//! use std::sync::Arc;
//!
//! let setting = Arc::new(Setting::new("example-max-size", "1024"));
//! let policy = SizePolicy::new(Arc::clone(&setting));
//! assert_eq!(policy.max_bytes(), 1024);
//!
//! setting.set("not-a-number");
//! assert_eq!(policy.max_bytes(), plugin_core::settings::DEFAULT_MAX_FILE_SIZE_BYTES);
//! ```

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Compiled-in ceiling for a single cached file (30 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 30 * 1024 * 1024;

/// Name of the maximum cached file size setting.
pub const MAX_FILE_SIZE_SETTING_NAME: &str = "max-plugin-file-byte-size";

/// Process-wide maximum cached file size setting.
pub static MAX_FILE_SIZE_SETTING: LazyLock<Arc<Setting>> = LazyLock::new(|| {
    Arc::new(Setting::new(
        MAX_FILE_SIZE_SETTING_NAME,
        DEFAULT_MAX_FILE_SIZE_BYTES.to_string(),
    ))
});

/// A named, string-valued setting that can change at runtime.
#[derive(Debug)]
pub struct Setting {
    name: &'static str,
    default: String,
    value: RwLock<Option<String>>,
}

impl Setting {
    /// Creates a setting with a default value and no override.
    #[must_use]
    pub fn new(name: &'static str, default: impl Into<String>) -> Self {
        Self {
            name,
            default: default.into(),
            value: RwLock::new(None),
        }
    }

    /// Setting name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Compiled-in default value.
    #[must_use]
    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Environment variable consulted when no runtime override is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_core::settings::Setting;
    ///
    /// let setting = Setting::new("max-plugin-file-byte-size", "1");
    /// assert_eq!(setting.env_var(), "PLUGIN_CACHE_MAX_PLUGIN_FILE_BYTE_SIZE");
    /// ```
    #[must_use]
    pub fn env_var(&self) -> String {
        format!(
            "PLUGIN_CACHE_{}",
            self.name.replace(['-', '.'], "_").to_uppercase()
        )
    }

    /// Returns the effective value.
    #[must_use]
    pub fn get(&self) -> String {
        let value = self
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        value
            .or_else(|| std::env::var(self.env_var()).ok())
            .unwrap_or_else(|| self.default.clone())
    }

    /// Installs a runtime override.
    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        tracing::debug!("Setting {} overridden to {:?}", self.name, value);
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// Removes the runtime override.
    pub fn reset(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Ceiling on the size of any single cached file.
///
/// Reads its setting on every call, so operator changes apply to the next
/// reconciliation pass without a restart.
#[derive(Debug, Clone)]
pub struct SizePolicy {
    setting: Arc<Setting>,
}

impl SizePolicy {
    /// Creates a policy backed by the given setting.
    #[must_use]
    pub const fn new(setting: Arc<Setting>) -> Self {
        Self { setting }
    }

    /// Policy backed by the process-wide [`MAX_FILE_SIZE_SETTING`].
    #[must_use]
    pub fn global() -> Self {
        Self::new(Arc::clone(&MAX_FILE_SIZE_SETTING))
    }

    /// Underlying setting.
    #[must_use]
    pub fn setting(&self) -> &Arc<Setting> {
        &self.setting
    }

    /// Maximum size in bytes for a single cached file.
    ///
    /// An unparsable value is logged at error level and replaced by
    /// [`DEFAULT_MAX_FILE_SIZE_BYTES`].
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        let raw = self.setting.get();
        match raw.trim().parse::<u64>() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    "failed to convert setting {} value {:?} to a byte count, using fallback {}: {}",
                    self.setting.name(),
                    raw,
                    DEFAULT_MAX_FILE_SIZE_BYTES,
                    e
                );
                DEFAULT_MAX_FILE_SIZE_BYTES
            }
        }
    }
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::global()
    }
}
