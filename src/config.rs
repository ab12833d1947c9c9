//! Comparison configuration: array identifier schema, ignored keys and policies.
//!
//! A configuration is supplied once per comparison and never changes during it.
//! It can be built in code or loaded from a JSON, YAML or TOML file:
//!
//! ```json
//! {
//!   "schema": { "otherSignatoryInfo": { "arrayItemIdentifier": "name" } },
//!   "ignoreKeys": ["updatedAt"],
//!   "missingIdentifier": "reject"
//! }
//! ```

use crate::error::{ParseError, RecdiffError};
use crate::parser::FormatHint;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// What to do when a field holds records in an array and the schema names no
/// identifier for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingIdentifierPolicy {
    /// Fail the comparison with `DiffError::MissingIdentifier`.
    #[default]
    Reject,
    /// Compare items by their whole serialized content, as a set.
    WholeItem,
}

/// Identifier entry for one array field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArrayIdentifier {
    #[serde(rename = "arrayItemIdentifier")]
    pub field: String,
}

/// Field name to identifier mapping for arrays of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Schema(HashMap<String, ArrayIdentifier>);

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, identifier: impl Into<String>) {
        self.0.insert(
            field.into(),
            ArrayIdentifier {
                field: identifier.into(),
            },
        );
    }

    /// Identifier used to match items of the array stored under `field`.
    pub fn identifier_for(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|entry| entry.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffConfig {
    pub schema: Schema,
    /// Field names skipped at every depth.
    #[serde(deserialize_with = "stringified_keys")]
    pub ignore_keys: HashSet<String>,
    pub missing_identifier: MissingIdentifierPolicy,
}

impl DiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches items of the array under `field` by their `identifier` property.
    pub fn identify(mut self, field: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.schema.insert(field, identifier);
        self
    }

    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignore_keys.insert(key.into());
        self
    }

    pub fn with_missing_identifier(mut self, policy: MissingIdentifierPolicy) -> Self {
        self.missing_identifier = policy;
        self
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore_keys.contains(key)
    }

    /// Loads a configuration file, picking the format from its extension.
    pub fn from_file(path: &Path) -> Result<Self, RecdiffError> {
        let display = path.to_string_lossy().to_string();
        if !path.exists() {
            return Err(ParseError::file_not_found(display).into());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ParseError::read_error(display.clone(), e))?;

        Self::from_str_with_format(&content, FormatHint::from_path(path)).map_err(|e| match e {
            RecdiffError::ConfigError { message } => {
                RecdiffError::config(format!("{}: {}", display, message))
            }
            other => other,
        })
    }

    /// Parses configuration text. `FormatHint::Auto` tries JSON, then YAML, then TOML.
    pub fn from_str_with_format(content: &str, hint: FormatHint) -> Result<Self, RecdiffError> {
        let config: DiffConfig = match hint {
            FormatHint::Json => {
                serde_json::from_str(content).map_err(|e| RecdiffError::config(e.to_string()))?
            }
            FormatHint::Yaml => {
                serde_yaml::from_str(content).map_err(|e| RecdiffError::config(e.to_string()))?
            }
            FormatHint::Toml => {
                toml::from_str(content).map_err(|e| RecdiffError::config(e.to_string()))?
            }
            FormatHint::Auto => serde_json::from_str(content)
                .ok()
                .or_else(|| serde_yaml::from_str(content).ok())
                .or_else(|| toml::from_str(content).ok())
                .ok_or_else(|| RecdiffError::config("unrecognized configuration format"))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecdiffError> {
        for (field, entry) in &self.schema.0 {
            if entry.field.trim().is_empty() {
                return Err(RecdiffError::config(format!(
                    "empty arrayItemIdentifier for field '{}'",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Ignore keys may be written as strings, numbers or booleans.
fn stringified_keys<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}
