//! Command implementations for the plugin cache CLI.
//!
//! Each command module resolves its configuration, runs the operation and
//! formats output according to the requested format.

pub mod common;
pub mod completions;
pub mod entries;
pub mod index;
pub mod reconcile;
pub mod watch;
