//! Document parsing for JSON, YAML and TOML.
//!
//! Parsed documents are converted into [`Node`] with the key order of the source
//! document preserved. Format detection goes by file extension; unknown
//! extensions are tried as JSON, then YAML, then TOML.
//!
//! # Examples
//!
//! ```no_run
//! use recdiff::parser::parse_file;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let previous = parse_file(Path::new("application_v1.json"))?;
//! let latest = parse_file(Path::new("application_v2.yaml"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::ParseError;
use crate::tree::{Node, Record};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Source format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Json,
    Yaml,
    Toml,
    /// Try JSON, then YAML, then TOML.
    Auto,
}

impl FormatHint {
    /// Picks a format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("json") => FormatHint::Json,
            Some("yaml") | Some("yml") => FormatHint::Yaml,
            Some("toml") => FormatHint::Toml,
            _ => FormatHint::Auto,
        }
    }
}

/// Parses a file into a Node.
///
/// # Errors
///
/// - `ParseError::FileNotFound` if the path does not exist
/// - `ParseError::ReadError` if it cannot be read
/// - `ParseError::JsonError` / `YamlError` / `TomlError` for invalid content
/// - `ParseError::UnknownFormat` if no format could parse a file without a known extension
pub fn parse_file(path: &Path) -> Result<Node, ParseError> {
    if !path.exists() {
        return Err(ParseError::file_not_found(
            path.to_string_lossy().to_string(),
        ));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ParseError::read_error(path.to_string_lossy().to_string(), e))?;

    parse_content(&content, FormatHint::from_path(path), &path.to_string_lossy())
}

/// Reads a whole document from standard input.
pub fn parse_stdin(hint: FormatHint) -> Result<Node, ParseError> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| ParseError::read_error("<stdin>", e))?;
    parse_content(&content, hint, "<stdin>")
}

/// Parses document text in the given format. `source` names the document in errors.
pub fn parse_content(content: &str, hint: FormatHint, source: &str) -> Result<Node, ParseError> {
    match hint {
        FormatHint::Json => parse_json(content).map_err(|e| ParseError::json_error(source, e)),
        FormatHint::Yaml => parse_yaml(content).map_err(|e| ParseError::yaml_error(source, e)),
        FormatHint::Toml => parse_toml(content).map_err(|e| ParseError::toml_error(source, e)),
        FormatHint::Auto => parse_json(content)
            .ok()
            .or_else(|| parse_yaml(content).ok())
            .or_else(|| parse_toml(content).ok())
            .ok_or_else(|| ParseError::unknown_format(source)),
    }
}

/// Parses a JSON string into a Node.
///
/// ```
/// use recdiff::parser::parse_json;
///
/// let node = parse_json(r#"{"companyName": "Swaniawski Group"}"#).unwrap();
/// assert!(node.as_record().is_some());
/// ```
pub fn parse_json(content: &str) -> Result<Node, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(json_to_node(value))
}

/// Parses a YAML string into a Node.
pub fn parse_yaml(content: &str) -> Result<Node, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(yaml_to_node(value))
}

/// Parses a TOML document into a Node. The root is always a table.
pub fn parse_toml(content: &str) -> Result<Node, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(toml_to_node(toml::Value::Table(table)))
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        json_to_node(value)
    }
}

fn json_to_node(value: serde_json::Value) -> Node {
    match value {
        serde_json::Value::Null => Node::Null,
        serde_json::Value::Bool(b) => Node::Bool(b),
        serde_json::Value::Number(n) => Node::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Node::String(s),
        serde_json::Value::Array(arr) => Node::Array(arr.into_iter().map(json_to_node).collect()),
        serde_json::Value::Object(obj) => Node::Object(
            obj.into_iter()
                .map(|(k, v)| (k, json_to_node(v)))
                .collect::<Record>(),
        ),
    }
}

/// Non-string keys are stringified; tags are dropped in favor of the tagged value.
fn yaml_to_node(value: serde_yaml::Value) -> Node {
    match value {
        serde_yaml::Value::Null => Node::Null,
        serde_yaml::Value::Bool(b) => Node::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                Node::Number(f)
            } else if let Some(i) = n.as_i64() {
                Node::Number(i as f64)
            } else if let Some(u) = n.as_u64() {
                Node::Number(u as f64)
            } else {
                Node::Number(0.0)
            }
        }
        serde_yaml::Value::String(s) => Node::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Node::Array(seq.into_iter().map(yaml_to_node).collect())
        }
        serde_yaml::Value::Mapping(map) => Node::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => s,
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        serde_yaml::Value::Null => "null".to_string(),
                        other => format!("{:?}", other),
                    };
                    (key, yaml_to_node(v))
                })
                .collect::<Record>(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_node(tagged.value),
    }
}

/// Datetimes become their RFC 3339 string form.
fn toml_to_node(value: toml::Value) -> Node {
    match value {
        toml::Value::String(s) => Node::String(s),
        toml::Value::Integer(i) => Node::Number(i as f64),
        toml::Value::Float(f) => Node::Number(f),
        toml::Value::Boolean(b) => Node::Bool(b),
        toml::Value::Datetime(dt) => Node::String(dt.to_string()),
        toml::Value::Array(arr) => Node::Array(arr.into_iter().map(toml_to_node).collect()),
        toml::Value::Table(table) => Node::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_node(v)))
                .collect::<Record>(),
        ),
    }
}
