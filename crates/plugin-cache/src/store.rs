//! Filesystem cache implementation.
//!
//! Provides the [`FilesystemCacheStore`] type that lists, populates, prunes
//! and deletes plugin bundle entries under a cache root.

use crate::checksum::file_matches;
use crate::error::{CacheError, Result};
use crate::index::ManifestIndex;
use globset::GlobBuilder;
use plugin_core::traits::BundleSource;
use plugin_core::{PluginResource, SizePolicy};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// One `name/version` directory under the cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheEntry {
    /// Plugin name (first path level)
    pub name: String,
    /// Plugin version (second path level)
    pub version: String,
    /// Absolute path of the version directory
    pub path: PathBuf,
}

/// Outcome of a successful materialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    /// Files written because they were new or changed
    pub written: usize,
    /// Files whose on-disk content already matched
    pub unchanged: usize,
    /// Stale files removed because the bundle no longer declares them
    pub removed: usize,
    /// Total bytes of declared content
    pub bytes: u64,
}

/// Aggregate numbers about the cache root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of `name/version` entries
    pub entries: usize,
    /// Number of cached files
    pub files: usize,
    /// Total size of cached files in bytes
    pub total_bytes: u64,
}

/// Filesystem-backed plugin bundle cache.
///
/// # Directory Structure
///
/// ```text
/// cache_root/
/// ├── elemental/
/// │   └── 1.2.0/
/// │       ├── package.json
/// │       └── plugin/
/// │           └── elemental.umd.min.js
/// └── kubewarden/
///     └── 2.1.0/
///         └── ...
/// ```
///
/// # Concurrency
///
/// The store does no locking of its own. Exactly one reconciler may write
/// under the root at a time.
///
/// # Examples
///
/// ```no_run
/// use plugin_cache::FilesystemCacheStore;
/// use plugin_core::SizePolicy;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemCacheStore::new("./plugin-cache", SizePolicy::global())?;
///
/// for entry in store.list_entries("*/*")? {
///     println!("{}@{}", entry.name, entry.version);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemCacheStore {
    root: PathBuf,
    policy: SizePolicy,
}

impl FilesystemCacheStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl AsRef<Path>, policy: SizePolicy) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root)?;
            tracing::debug!("Created plugin cache directory: {}", root.display());
        }

        Ok(Self { root, policy })
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Size policy applied during materialization.
    #[must_use]
    pub const fn policy(&self) -> &SizePolicy {
        &self.policy
    }

    /// Path of the `name/version` entry. Does not check existence.
    #[must_use]
    pub fn entry_path(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }

    /// Enumerates on-disk entries two levels below the root whose
    /// root-relative path matches `pattern` (e.g. `*/*`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the root cannot be
    /// walked.
    pub fn list_entries(&self, pattern: &str) -> Result<Vec<CacheEntry>> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| CacheError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        let mut entries = Vec::new();
        for dir in WalkDir::new(&self.root).min_depth(2).max_depth(2) {
            let dir = dir?;
            if !dir.file_type().is_dir() {
                continue;
            }

            let Ok(relative) = dir.path().strip_prefix(&self.root) else {
                continue;
            };
            let mut parts = relative.components().map(|c| c.as_os_str().to_str());
            let (Some(Some(name)), Some(Some(version))) = (parts.next(), parts.next()) else {
                tracing::warn!(
                    "Skipping cache directory with a non UTF-8 name: {}",
                    dir.path().display()
                );
                continue;
            };

            if !matcher.is_match(format!("{name}/{version}")) {
                continue;
            }

            entries.push(CacheEntry {
                name: name.to_string(),
                version: version.to_string(),
                path: dir.path().to_path_buf(),
            });
        }

        entries.sort();
        Ok(entries)
    }

    /// Removes every entry in `entries` that the index does not allow on
    /// disk: unknown name, different version, or caching disabled.
    ///
    /// Never creates content and is idempotent. Returns the removed entries;
    /// entries that fail to delete are logged and left for the next pass.
    pub fn sync_with_index(&self, index: &ManifestIndex, entries: &[CacheEntry]) -> Vec<CacheEntry> {
        let mut pruned = Vec::new();

        for entry in entries {
            if index.is_cached(&entry.name, &entry.version) {
                continue;
            }

            match self.delete(&entry.name, &entry.version) {
                Ok(()) => {
                    tracing::warn!(
                        "Pruned orphaned cache entry {}@{}",
                        entry.name,
                        entry.version
                    );
                    pruned.push(entry.clone());
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to prune cache entry {}@{}: {}",
                        entry.name,
                        entry.version,
                        e
                    );
                }
            }
        }

        pruned
    }

    /// Materializes the bundle declared by `resource` under its
    /// `name/version` entry.
    ///
    /// Resources with `noCache` set are skipped. Files whose content is
    /// already on disk are not rewritten, and files the bundle no longer
    /// declares are removed once every declared file has been written.
    ///
    /// # Errors
    ///
    /// * [`CacheError::MaxFileSizeExceeded`] - a file is over the ceiling;
    ///   files written before it are left in place
    /// * [`CacheError::InvalidEntry`] - unsafe name, version or file path
    /// * [`CacheError::Source`] - the bundle could not be read
    /// * I/O errors if writing fails
    pub async fn sync_with_controllers_cache(
        &self,
        resource: &PluginResource,
        source: &dyn BundleSource,
    ) -> Result<MaterializeReport> {
        let entry = resource.entry();
        if entry.no_cache {
            return Ok(MaterializeReport::default());
        }

        validate_component(&entry.name)?;
        validate_component(&entry.version)?;

        let limit = self.policy.max_bytes();
        let source_error = |err| CacheError::Source {
            name: entry.name.clone(),
            version: entry.version.clone(),
            source: err,
        };

        let declared = source.list_files(entry).await.map_err(source_error)?;
        let mut files = Vec::with_capacity(declared.len());
        for file in &declared {
            validate_relative_path(file)?;
            files.push(clean_relative(file));
        }

        let dir = self.entry_path(&entry.name, &entry.version);
        fs::create_dir_all(&dir)?;

        let mut report = MaterializeReport::default();
        for (declared_path, file) in declared.iter().zip(&files) {
            let content = match source.fetch_file(entry, declared_path, limit).await {
                Ok(content) => content,
                Err(plugin_core::Error::FileTooLarge { size, .. }) => {
                    return Err(self.size_violation(resource, file, size, limit));
                }
                Err(e) => return Err(source_error(e)),
            };

            let size = content.len() as u64;
            if size > limit {
                return Err(self.size_violation(resource, file, size, limit));
            }

            let target = dir.join(file);
            if file_matches(&target, &content)? {
                report.unchanged += 1;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, &content)?;
                report.written += 1;
                tracing::debug!("Cached {}@{}/{}", entry.name, entry.version, file);
            }
            report.bytes += size;
        }

        report.removed = remove_undeclared(&dir, &files)?;

        tracing::info!(
            "Cached plugin {}@{} ({} written, {} unchanged, {} removed)",
            entry.name,
            entry.version,
            report.written,
            report.unchanged,
            report.removed
        );

        Ok(report)
    }

    fn size_violation(
        &self,
        resource: &PluginResource,
        path: &str,
        size: u64,
        limit: u64,
    ) -> CacheError {
        let entry = resource.entry();
        tracing::debug!(
            "Stopping materialization of {}@{} under {}",
            entry.name,
            entry.version,
            self.root.display()
        );
        CacheError::MaxFileSizeExceeded {
            name: entry.name.clone(),
            version: entry.version.clone(),
            path: path.to_string(),
            size,
            limit,
        }
    }

    /// Removes the `name/version` entry, and the name directory once it
    /// holds no other versions.
    ///
    /// An entry that is already absent is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidEntry`] for unsafe names, or the I/O
    /// error if removal fails.
    pub fn delete(&self, name: &str, version: &str) -> Result<()> {
        validate_component(name)?;
        validate_component(version)?;

        let dir = self.entry_path(name, version);
        match fs::remove_dir_all(&dir) {
            Ok(()) => tracing::debug!("Removed cache entry: {}", dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let name_dir = self.root.join(name);
        if let Ok(mut remaining) = fs::read_dir(&name_dir)
            && remaining.next().is_none()
        {
            match fs::remove_dir(&name_dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Relative paths of the files cached for `name/version`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be walked.
    pub fn entry_files(&self, name: &str, version: &str) -> Result<Vec<String>> {
        let dir = self.entry_path(name, version);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for file in WalkDir::new(&dir) {
            let file = file?;
            if file.file_type().is_file()
                && let Ok(relative) = file.path().strip_prefix(&dir)
            {
                files.push(normalize(relative));
            }
        }

        files.sort();
        Ok(files)
    }

    /// Counts entries, files and bytes under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be walked.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats {
            entries: self.list_entries(plugin_core::DEFAULT_ENTRY_PATTERN)?.len(),
            ..CacheStats::default()
        };

        for file in WalkDir::new(&self.root).min_depth(3) {
            let file = file?;
            if file.file_type().is_file() {
                stats.files += 1;
                stats.total_bytes += file.metadata()?.len();
            }
        }

        Ok(stats)
    }
}

/// Deletes files under `dir` that are not in `declared`, then any
/// directories left empty. Returns the number of files removed.
fn remove_undeclared(dir: &Path, declared: &[String]) -> Result<usize> {
    let declared: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let mut removed = 0;

    for file in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let file = file?;
        let Ok(relative) = file.path().strip_prefix(dir) else {
            continue;
        };

        if file.file_type().is_dir() {
            // Fails harmlessly when the directory still has content
            let _ = fs::remove_dir(file.path());
        } else if !declared.contains(normalize(relative).as_str()) {
            fs::remove_file(file.path())?;
            removed += 1;
            tracing::debug!("Removed undeclared file: {}", file.path().display());
        }
    }

    Ok(removed)
}

fn normalize(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}

/// Drops `.` components so declared paths compare equal to on-disk ones.
fn clean_relative(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Validates that a plugin name or version is a single safe path component.
///
/// Rejects empty values, `.`/`..`, path separators and control characters.
fn validate_component(value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "cannot be empty"
    } else if value == "." || value == ".." {
        "cannot be '.' or '..'"
    } else if value.contains('/') || value.contains('\\') {
        "cannot contain path separators"
    } else if value.chars().any(char::is_control) {
        "cannot contain control characters"
    } else {
        return Ok(());
    };

    Err(CacheError::InvalidEntry {
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

/// Validates that a declared bundle file stays inside its entry.
fn validate_relative_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| CacheError::InvalidEntry {
        value: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("file path cannot be empty"));
    }
    if path.chars().any(char::is_control) {
        return Err(invalid("file path cannot contain control characters"));
    }

    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("file path cannot contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("file path must be relative"));
            }
        }
    }

    Ok(())
}
