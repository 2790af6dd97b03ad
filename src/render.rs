//! Turn a materialized result set into text for the console.
//!
//! The full text is built before anything is written, so a caller either
//! prints every row or nothing.

use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::errors::InspectError;
use crate::inspector::ResultSet;

/// Output layouts for a result set.
///
/// Settings files and env overrides both go through [`FromStr`].
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of objects
    #[default]
    Json,
    /// Numbered, indented `column: value` records
    Records,
}

#[derive(Error, Debug)]
#[error("unknown output format {0:?} (expected \"json\" or \"records\")")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "records" => Ok(OutputFormat::Records),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = UnknownFormat;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Render the whole set as text, always ending in a newline.
pub fn render(rows: &ResultSet, format: OutputFormat) -> Result<String, InspectError> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Records => records(rows),
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Render, then write everything in one call and flush.
/// Returns the number of bytes written.
pub fn write_result_set<W: Write>(
    rows: &ResultSet,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize, InspectError> {
    let text = render(rows, format)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(text.len())
}

fn records(rows: &ResultSet) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }

    let mut text = String::new();
    for (n, row) in rows.rows().iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(text, "[{}]", n + 1);
        for (name, value) in row.iter() {
            // Continuation lines stay indented so a value can't fake a header.
            let value = value.to_string().replace('\n', "\n    ");
            let _ = writeln!(text, "  {}: {}", name, value);
        }
    }
    text
}
