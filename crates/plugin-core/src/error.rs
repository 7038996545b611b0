//! Error types shared by the plugin cache crates.
//!
//! Collaborators (resource stores, bundle sources) report failures through
//! this type so that the reconciler can tell conflicts and oversized files
//! apart from plain I/O trouble.
//!
//! # Examples
//!
//! ```
//! use plugin_core::{Error, Result};
//!
//! fn require_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(Error::ValidationError {
//!             field: "spec.plugin.name".to_string(),
//!             reason: "must not be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_name("").unwrap_err();
//! assert!(err.is_validation_error());
//! ```

use thiserror::Error;

/// Main error type for plugin cache collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested resource does not exist in the store.
    #[error("Resource not found: {key}")]
    NotFound {
        /// `namespace/name` key of the missing resource
        key: String,
    },

    /// Optimistic concurrency check failed on update.
    ///
    /// The caller submitted a resource whose `resource_version` no longer
    /// matches the stored one.
    #[error("Conflict updating {key}: expected version {expected}, found {actual}")]
    Conflict {
        /// `namespace/name` key of the conflicting resource
        key: String,
        /// Version carried by the submitted resource
        expected: u64,
        /// Version currently held by the store
        actual: u64,
    },

    /// A bundle file is larger than the permitted ceiling.
    ///
    /// Bundle sources return this when they learn the size before
    /// downloading the body.
    #[error("File {path} is {size} bytes, exceeding the limit of {limit} bytes")]
    FileTooLarge {
        /// Bundle-relative file path
        path: String,
        /// Reported size in bytes
        size: u64,
        /// Active ceiling in bytes
        limit: u64,
    },

    /// Bundle source could not produce the requested content.
    #[error("Bundle source error for {endpoint}: {message}")]
    SourceError {
        /// Endpoint the source was reading from
        endpoint: String,
        /// Description of the failure
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Domain value failed validation.
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },

    /// I/O error from a filesystem-backed collaborator.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl Error {
    /// Returns `true` if this is an optimistic concurrency conflict.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_core::Error;
    ///
    /// let err = Error::Conflict {
    ///     key: "plugin-system/foo".to_string(),
    ///     expected: 1,
    ///     actual: 2,
    /// };
    /// assert!(err.is_conflict());
    /// ```
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if the resource was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if a bundle file exceeded the size ceiling.
    #[must_use]
    pub const fn is_file_too_large(&self) -> bool {
        matches!(self, Self::FileTooLarge { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias for plugin cache collaborators.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = Error::Conflict {
            key: "plugin-system/foo".to_string(),
            expected: 3,
            actual: 4,
        };

        let display = err.to_string();
        assert!(display.contains("plugin-system/foo"));
        assert!(display.contains("expected version 3"));
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_file_too_large_display() {
        let err = Error::FileTooLarge {
            path: "plugin.umd.min.js".to_string(),
            size: 2048,
            limit: 1024,
        };

        assert!(err.is_file_too_large());
        assert!(err.to_string().contains("2048 bytes"));
        assert!(err.to_string().contains("limit of 1024"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_serde_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(
            err,
            Error::SerializationError {
                source: Some(_),
                ..
            }
        ));
    }
}
