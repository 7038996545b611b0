//! Error types for the manifest index and filesystem cache.

/// Result type for filesystem cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while enumerating, materializing or deleting
/// cache entries.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// A declared file is larger than the configured ceiling.
    ///
    /// Materialization of the plugin stops at the offending file. Files
    /// written before it stay on disk; the caller removes them with
    /// [`crate::FilesystemCacheStore::delete`].
    #[error(
        "File {path} of plugin {name}@{version} is {size} bytes, exceeding the limit of {limit} bytes"
    )]
    MaxFileSizeExceeded {
        /// Plugin name
        name: String,
        /// Plugin version
        version: String,
        /// Bundle-relative path of the offending file
        path: String,
        /// File size in bytes
        size: u64,
        /// Active ceiling in bytes
        limit: u64,
    },

    /// A name, version or file path is not safe to use on disk.
    #[error("Invalid cache entry {value:?}: {reason}")]
    InvalidEntry {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The bundle source failed to list or read files.
    #[error("Failed to read bundle of plugin {name}@{version}: {source}")]
    Source {
        /// Plugin name
        name: String,
        /// Plugin version
        version: String,
        /// Underlying collaborator error
        #[source]
        source: plugin_core::Error,
    },

    /// The entry glob could not be compiled.
    #[error("Invalid entry pattern {pattern:?}: {source}")]
    Pattern {
        /// The rejected pattern
        pattern: String,
        /// Underlying glob error
        #[source]
        source: globset::Error,
    },

    /// Directory traversal failed.
    #[error("Failed to walk cache directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Returns `true` if this is the size policy violation.
    ///
    /// The reconciler self-heals these instead of failing the pass.
    #[must_use]
    pub const fn is_max_file_size_exceeded(&self) -> bool {
        matches!(self, Self::MaxFileSizeExceeded { .. })
    }
}

/// Errors from manifest index generation.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// A resource lacks a field the index is keyed on.
    #[error("Plugin resource {key} is missing required field {field}")]
    MissingIdentity {
        /// `namespace/name` key of the malformed resource
        key: String,
        /// Name of the empty field
        field: &'static str,
    },

    /// Index serialization failed.
    #[error("Failed to serialize index: {0}")]
    Serialization(#[from] serde_json::Error),
}
