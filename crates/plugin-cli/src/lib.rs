//! Plugin cache CLI library.
//!
//! Exposes the command implementations and formatters so they can be
//! tested apart from the binary.

#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod commands;
pub mod formatters;
