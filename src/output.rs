//! Output formatting for diff results.
//!
//! A [`DiffTree`] is rendered either as one line per leaf change (terminal with
//! colors, or plain text), or as the JSON response envelope.
//!
//! Line paths join keys with dots. Matched array items appear as `field[id]`,
//! set changes in scalar arrays as `field[]`.
//!
//! # Examples
//!
//! ```
//! use recdiff::{compare_records, format_diff, DiffConfig, OutputFormat, OutputOptions, Record};
//!
//! let previous = Record::new().with("age", 30);
//! let latest = Record::new().with("age", 31);
//! let diff = compare_records(&previous, &latest, &DiffConfig::default()).unwrap();
//!
//! let output = format_diff(&diff, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.contains("• age: 30 → 31"));
//! ```

use crate::diff::{Change, DiffEntry, DiffStats, DiffTree};
use crate::error::{DiffError, OutputError};
use crate::response::Response;
use colored::*;
use serde_json::Value;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored terminal output with ANSI escape codes
    Terminal,
    /// JSON response envelope
    Json,
    /// Plain text, no colors (suitable for piping)
    Plain,
}

/// Options for controlling line output.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Show full values instead of previews for records and arrays
    pub show_values: bool,
    /// Maximum length for displayed values (truncate if longer)
    pub max_value_length: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            show_values: false,
            max_value_length: 80,
        }
    }
}

/// Formats a diff according to the specified format and options.
pub fn format_diff(
    diff: &DiffTree,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Terminal => Ok(format_terminal(diff, options)),
        OutputFormat::Json => format_json(&Response::success(diff.clone())),
        OutputFormat::Plain => Ok(format_plain(diff, options)),
    }
}

/// Renders a failed comparison as the JSON error envelope.
pub fn format_failure(error: &DiffError) -> Result<String, OutputError> {
    format_json(&Response::failure(error))
}

fn format_json(response: &Response) -> Result<String, OutputError> {
    serde_json::to_string_pretty(response)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

/// Formats a diff for terminal output with colors.
///
/// Additions are green, deletions red and modifications yellow.
fn format_terminal(diff: &DiffTree, options: &OutputOptions) -> String {
    if diff.is_empty() {
        return "No changes detected.".dimmed().to_string();
    }

    let mut output = String::new();
    for (path, change) in leaf_changes(diff) {
        output.push_str(&format_change_terminal(&path, change, options));
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&format_summary(&diff.stats()));
    output
}

fn format_change_terminal(path: &[String], change: &Change, options: &OutputOptions) -> String {
    let path = format_path(path);

    match change {
        Change::Addition { to } | Change::ArrayItemAddition { to, .. } => {
            let value = format_value(to, options);
            format!("{} {}: {}", "+".bright_green(), path.green(), value.green())
        }
        Change::Deletion { from } | Change::ArrayItemDeletion { from, .. } => {
            let value = format_value(from, options);
            format!("{} {}: {}", "-".bright_red(), path.red(), value.red())
        }
        Change::Modification { from, to } => format!(
            "{} {}: {} {} {}",
            "•".bright_yellow(),
            path.yellow(),
            format_value(from, options).yellow(),
            "→".bright_yellow(),
            format_value(to, options).yellow()
        ),
        Change::ArrayItemModification { .. } => String::new(),
    }
}

/// Formats a diff for plain text output (no colors).
fn format_plain(diff: &DiffTree, options: &OutputOptions) -> String {
    if diff.is_empty() {
        return "No changes detected.".to_string();
    }

    let mut output = String::new();
    for (path, change) in leaf_changes(diff) {
        output.push_str(&format_change_plain(&path, change, options));
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&format_summary(&diff.stats()));
    output
}

fn format_change_plain(path: &[String], change: &Change, options: &OutputOptions) -> String {
    let path = format_path(path);

    match change {
        Change::Addition { to } | Change::ArrayItemAddition { to, .. } => {
            format!("+ {}: {}", path, format_value(to, options))
        }
        Change::Deletion { from } | Change::ArrayItemDeletion { from, .. } => {
            format!("- {}: {}", path, format_value(from, options))
        }
        Change::Modification { from, to } => format!(
            "• {}: {} → {}",
            path,
            format_value(from, options),
            format_value(to, options)
        ),
        Change::ArrayItemModification { .. } => String::new(),
    }
}

/// Leaf changes with their paths, depth first in tree order. Modified array
/// items are expanded into the changes inside them.
fn leaf_changes(diff: &DiffTree) -> Vec<(Vec<String>, &Change)> {
    let mut lines = Vec::new();
    collect_leaves(diff, &mut Vec::new(), &mut lines);
    lines
}

fn collect_leaves<'a>(
    tree: &'a DiffTree,
    prefix: &mut Vec<String>,
    lines: &mut Vec<(Vec<String>, &'a Change)>,
) {
    for (key, entry) in tree.iter() {
        prefix.push(key.to_string());
        match entry {
            DiffEntry::Change(change) => lines.push((prefix.clone(), change)),
            DiffEntry::Nested(nested) => collect_leaves(nested, prefix, lines),
            DiffEntry::Array(changes) => {
                for change in changes {
                    let segment = match change.identifier() {
                        Some(id) => format!("[{}]", format_identifier(id)),
                        None => "[]".to_string(),
                    };
                    prefix.push(segment);
                    match change {
                        Change::ArrayItemModification { difference, .. } => {
                            collect_leaves(difference, prefix, lines)
                        }
                        _ => lines.push((prefix.clone(), change)),
                    }
                    prefix.pop();
                }
            }
        }
        prefix.pop();
    }
}

fn format_identifier(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Joins path components with dots, attaching bracketed segments directly.
///
/// - `["user", "name"]` → `"user.name"`
/// - `["signers", "[A]", "flag"]` → `"signers[A].flag"`
fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }

    let mut result = String::new();
    for (i, component) in path.iter().enumerate() {
        if !component.starts_with('[') && i > 0 {
            result.push('.');
        }
        result.push_str(component);
    }
    result
}

fn format_value(value: &Value, options: &OutputOptions) -> String {
    if options.show_values {
        value.to_string()
    } else {
        preview(value, options.max_value_length)
    }
}

/// Short preview of a value, truncated to `max_len` characters.
fn preview(value: &Value, max_len: usize) -> String {
    let preview = match value {
        Value::Object(map) => match map.len() {
            0 => "{}".to_string(),
            1 => "{ 1 key }".to_string(),
            count => format!("{{ {} keys }}", count),
        },
        Value::Array(items) => match items.len() {
            0 => "[]".to_string(),
            1 => "[ 1 item ]".to_string(),
            count => format!("[ {} items ]", count),
        },
        scalar => scalar.to_string(),
    };

    if preview.chars().count() > max_len {
        let kept: String = preview.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        preview
    }
}

fn format_summary(stats: &DiffStats) -> String {
    if stats.is_empty() {
        return "Summary: No changes".to_string();
    }

    let mut parts = Vec::new();
    if stats.added > 0 {
        parts.push(format!("{} added", stats.added));
    }
    if stats.removed > 0 {
        parts.push(format!("{} removed", stats.removed));
    }
    if stats.modified > 0 {
        parts.push(format!("{} modified", stats.modified));
    }

    format!("Summary: {}", parts.join(", "))
}
