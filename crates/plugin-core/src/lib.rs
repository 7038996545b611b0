//! Core types, traits, settings and errors for the plugin cache.
//!
//! This crate provides the foundational types shared by the cache store,
//! the reconciler and the CLI.
//!
//! # Architecture
//!
//! The core consists of:
//! - Plugin resource model (`PluginResource`, `PluginEntry`, `CacheState`)
//! - Error hierarchy for collaborators
//! - Collaborator traits (`ResourceStore`, `BundleSource`)
//! - Dynamic settings and the file size policy
//! - Reconciler configuration

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod types;

pub mod settings;
pub mod traits;

pub use config::{
    DEFAULT_ENTRY_PATTERN, DEFAULT_NAMESPACE, ReconcilerConfig, ReconcilerConfigBuilder,
};
pub use error::{Error, Result};
pub use settings::{Setting, SizePolicy};
pub use types::{
    CacheState, ObjectMeta, PluginEntry, PluginResource, PluginSpec, PluginStatus, Selector,
    resource_key,
};
