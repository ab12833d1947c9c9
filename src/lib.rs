//! recdiff - structural diff for nested records.
//!
//! Compares two versions of a nested document (typically a multi-stage
//! onboarding or KYC application) and returns a tree naming only what changed.
//! Arrays of records are matched by a configured identifier field, arrays of
//! scalars are compared as sets, and object/null transitions are expanded into
//! leaf-level changes.
//!
//! # Example
//!
//! ```no_run
//! use recdiff::{compare_nodes, format_diff, parse_file, DiffConfig, OutputFormat, OutputOptions};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let previous = parse_file(Path::new("application_v1.json"))?;
//! let latest = parse_file(Path::new("application_v2.json"))?;
//!
//! let config = DiffConfig::new()
//!     .identify("otherSignatoryInfo", "name")
//!     .ignore("updatedAt");
//! let diff = compare_nodes(&previous, &latest, &config)?;
//!
//! let output = format_diff(&diff, &OutputFormat::Terminal, &OutputOptions::default())?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

mod array;
pub mod config;
pub mod cycle;
pub mod diff;
pub mod error;
pub mod logging;
pub mod output;
pub mod parser;
pub mod response;
mod transition;
pub mod tree;

// Re-export commonly used types for convenience
pub use config::{DiffConfig, MissingIdentifierPolicy, Schema};
pub use cycle::ensure_acyclic;
pub use diff::{compare_nodes, compare_records, Change, ChangeKind, DiffEntry, DiffStats, DiffTree};
pub use error::{DiffError, OutputError, ParseError, RecdiffError};
pub use output::{format_diff, format_failure, OutputFormat, OutputOptions};
pub use parser::{parse_content, parse_file, parse_json, parse_stdin, parse_toml, parse_yaml, FormatHint};
pub use response::{Response, Status};
pub use tree::{Node, Record};
