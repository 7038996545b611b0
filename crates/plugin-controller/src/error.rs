//! Error types for reconciliation passes.

use plugin_cache::{CacheError, IndexError};
use std::fmt;

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// A materialization failure recorded against one plugin.
#[derive(Debug)]
pub struct MaterializationFailure {
    /// `namespace/name` key of the resource
    pub key: String,
    /// Underlying cache error
    pub error: CacheError,
}

/// The two manifest indexes a pass generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Every listed plugin
    Full,
    /// Plugins served without authentication
    Anonymous,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Why a reconciliation pass failed.
///
/// [`List`](Self::List), [`Index`](Self::Index) and
/// [`Enumerate`](Self::Enumerate) abort the pass before the cache is
/// modified. [`Materialization`](Self::Materialization) is reported after
/// every resource has been attempted.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    /// The reconciler configuration is invalid.
    #[error("Invalid reconciler configuration: {0}")]
    Config(#[source] plugin_core::Error),

    /// The cache root could not be opened.
    #[error("Failed to open plugin cache root: {0}")]
    CacheRoot(#[source] CacheError),

    /// The resource store could not be listed.
    #[error("Failed to list plugin resources in {namespace}: {source}")]
    List {
        /// Namespace that was listed
        namespace: String,
        /// Store error
        #[source]
        source: plugin_core::Error,
    },

    /// One of the manifest indexes could not be generated.
    #[error("Failed to generate {kind} plugin index: {source}")]
    Index {
        /// Which index failed
        kind: IndexKind,
        /// Index error
        #[source]
        source: IndexError,
    },

    /// On-disk cache entries could not be enumerated.
    #[error("Failed to enumerate plugin cache entries: {0}")]
    Enumerate(#[source] CacheError),

    /// One or more plugins failed to materialize for reasons other than
    /// the size policy.
    #[error("Failed to cache {} plugin(s): {}", .0.len(), summarize(.0))]
    Materialization(Vec<MaterializationFailure>),

    /// The controller worker is no longer accepting notifications.
    #[error("Plugin controller has stopped")]
    Stopped,

    /// The controller worker panicked or was cancelled.
    #[error("Plugin controller worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ReconcileError {
    /// Returns `true` if the pass aborted before touching the cache.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Materialization(_))
    }

    /// Number of per-plugin failures carried by this error.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        match self {
            Self::Materialization(failures) => failures.len(),
            _ => 0,
        }
    }
}

fn summarize(failures: &[MaterializationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.key, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_error_is_fatal() {
        let error = ReconcileError::List {
            namespace: "plugin-system".to_string(),
            source: plugin_core::Error::SourceError {
                endpoint: "store".to_string(),
                message: "unavailable".to_string(),
            },
        };
        assert!(error.is_fatal());
        assert!(error.to_string().contains("plugin-system"));
        assert_eq!(error.failure_count(), 0);
    }

    #[test]
    fn test_index_error_names_index() {
        let error = ReconcileError::Index {
            kind: IndexKind::Anonymous,
            source: IndexError::MissingIdentity {
                key: "ns/x".to_string(),
                field: "spec.plugin.name",
            },
        };
        assert!(error.to_string().contains("anonymous"));
    }

    #[test]
    fn test_materialization_summary() {
        let error = ReconcileError::Materialization(vec![
            MaterializationFailure {
                key: "ns/a".to_string(),
                error: std::io::Error::other("disk full").into(),
            },
            MaterializationFailure {
                key: "ns/b".to_string(),
                error: CacheError::InvalidEntry {
                    value: "..".to_string(),
                    reason: "not a single path component".to_string(),
                },
            },
        ]);

        assert!(!error.is_fatal());
        assert_eq!(error.failure_count(), 2);
        let display = error.to_string();
        assert!(display.starts_with("Failed to cache 2 plugin(s)"));
        assert!(display.contains("ns/a: IO error: disk full"));
    }
}
