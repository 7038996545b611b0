//! Output formatters for CLI commands.
//!
//! Provides consistent formatting across all CLI commands for JSON, text, and pretty output modes.

use crate::cli::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use plugin_cli::cli::OutputFormat;
/// use plugin_cli::formatters::format_output;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Entry {
///     name: String,
///     version: String,
/// }
///
/// let entry = Entry {
///     name: "elemental".to_string(),
///     version: "1.2.0".to_string(),
/// };
///
/// let output = format_output(&entry, OutputFormat::Json)?;
/// assert!(output.contains("\"name\""));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as JSON with 2-space indentation.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format data as compact JSON.
    pub fn format_compact<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize, json};

    /// Format data as single-line JSON, suitable for piping.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        json::format_compact(data)
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;
    use std::fmt::Write;

    /// Format data as colorized, indented output.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        write_value(&mut out, &value, 0)?;
        Ok(out)
    }

    fn write_value(out: &mut String, value: &Value, indent: usize) -> Result<()> {
        let pad = "  ".repeat(indent);

        match value {
            Value::Null => write!(out, "{}", "-".dimmed())?,
            Value::Bool(b) => write!(out, "{}", b.to_string().yellow())?,
            Value::Number(n) => write!(out, "{}", n.to_string().cyan())?,
            Value::String(s) => write!(out, "{}", s.green())?,
            Value::Array(items) if items.is_empty() => write!(out, "{}", "(none)".dimmed())?,
            Value::Array(items) => {
                for item in items {
                    write!(out, "\n{pad}- ")?;
                    write_value(out, item, indent + 1)?;
                }
            }
            Value::Object(fields) if fields.is_empty() => write!(out, "{}", "(empty)".dimmed())?,
            Value::Object(fields) => {
                for (i, (key, field)) in fields.iter().enumerate() {
                    if indent > 0 || i > 0 {
                        write!(out, "\n{pad}")?;
                    }
                    write!(out, "{}: ", key.blue().bold())?;
                    write_value(out, field, indent + 1)?;
                }
            }
        }

        Ok(())
    }
}
