//! recdiff command-line interface.
//!
//! Loads two versions of a record, compares them with the configured schema and
//! prints the changes. Exit codes: 0 when nothing changed, 1 when changes were
//! found, 2 on any error.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use recdiff::{
    compare_nodes, format_diff, format_failure, logging, parse_file, parse_stdin, DiffConfig,
    FormatHint, MissingIdentifierPolicy, Node, OutputFormat, OutputOptions,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

/// recdiff - structural diff for nested records
///
/// Compares two versions of a JSON, YAML or TOML document and reports only the
/// fields that changed. Arrays of records are matched by identifier fields.
#[derive(Parser)]
#[command(name = "recdiff")]
#[command(version)]
#[command(about = "Structural diff for nested records", long_about = None)]
struct Cli {
    /// Previous version of the record ("-" reads stdin)
    #[arg(value_name = "PREVIOUS")]
    previous: PathBuf,

    /// Latest version of the record ("-" reads stdin)
    #[arg(value_name = "LATEST")]
    latest: PathBuf,

    /// Configuration file with schema and ignored keys
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Identifier for an array of records, as FIELD=IDENTIFIER
    #[arg(short, long, value_name = "FIELD=IDENTIFIER", value_parser = parse_schema_entry)]
    schema: Vec<(String, String)>,

    /// Key to leave out of the comparison at every depth
    #[arg(short, long, value_name = "KEY")]
    ignore: Vec<String>,

    /// What to do with record arrays that have no configured identifier
    #[arg(long, value_enum)]
    missing_identifier: Option<MissingIdentifierArg>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Show full values instead of previews
    #[arg(long)]
    show_values: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// Verbose output (show parsing progress)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show changes, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored terminal output
    Terminal,
    /// JSON response envelope
    Json,
    /// Plain text (no colors)
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MissingIdentifierArg {
    /// Fail the comparison
    Reject,
    /// Compare items by their whole content
    WholeItem,
}

impl From<MissingIdentifierArg> for MissingIdentifierPolicy {
    fn from(arg: MissingIdentifierArg) -> Self {
        match arg {
            MissingIdentifierArg::Reject => MissingIdentifierPolicy::Reject,
            MissingIdentifierArg::WholeItem => MissingIdentifierPolicy::WholeItem,
        }
    }
}

fn parse_schema_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, identifier)) if !field.trim().is_empty() && !identifier.trim().is_empty() => {
            Ok((field.trim().to_string(), identifier.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=IDENTIFIER, got '{}'", raw)),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    if cli.previous.as_os_str() == "-" && cli.latest.as_os_str() == "-" {
        bail!("only one of PREVIOUS and LATEST can be read from stdin");
    }

    let config = build_config(&cli)?;

    let previous = load(&cli.previous)
        .with_context(|| format!("Failed to parse previous record: {}", cli.previous.display()))?;
    let latest = load(&cli.latest)
        .with_context(|| format!("Failed to parse latest record: {}", cli.latest.display()))?;

    info!("Computing diff...");
    let output_format: OutputFormat = cli.format.into();

    let diff = match compare_nodes(&previous, &latest, &config) {
        Ok(diff) => diff,
        Err(err) if output_format == OutputFormat::Json => {
            println!("{}", format_failure(&err).context("Failed to format error")?);
            return Ok(2);
        }
        Err(err) => return Err(anyhow::Error::new(err).context("Comparison failed")),
    };

    let output_options = OutputOptions {
        show_values: cli.show_values,
        max_value_length: cli.max_value_length,
    };

    let output = format_diff(&diff, &output_format, &output_options)
        .context("Failed to format diff output")?;

    if !cli.quiet {
        println!("{}", output);
    } else {
        for line in output.lines() {
            if !line.starts_with("Summary:") && !line.trim().is_empty() {
                println!("{}", line);
            }
        }
    }

    if diff.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Config file first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<DiffConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}...", path.display());
            DiffConfig::from_file(path)?
        }
        None => DiffConfig::default(),
    };

    for (field, identifier) in &cli.schema {
        config = config.identify(field.clone(), identifier.clone());
    }
    for key in &cli.ignore {
        config = config.ignore(key.clone());
    }
    if let Some(policy) = cli.missing_identifier {
        config = config.with_missing_identifier(policy.into());
    }

    Ok(config)
}

fn load(path: &Path) -> Result<Node> {
    if path.as_os_str() == "-" {
        info!("Parsing <stdin>...");
        return Ok(parse_stdin(FormatHint::Auto)?);
    }
    info!("Parsing {}...", path.display());
    Ok(parse_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(
            OutputFormat::from(OutputFormatArg::Terminal),
            OutputFormat::Terminal
        );
        assert_eq!(
            OutputFormat::from(OutputFormatArg::Json),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::from(OutputFormatArg::Plain),
            OutputFormat::Plain
        );
    }

    #[test]
    fn test_parse_schema_entry() {
        assert_eq!(
            parse_schema_entry("otherSignatoryInfo=name"),
            Ok(("otherSignatoryInfo".to_string(), "name".to_string()))
        );
        assert!(parse_schema_entry("otherSignatoryInfo").is_err());
        assert!(parse_schema_entry("=name").is_err());
        assert!(parse_schema_entry("signers=").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "recdiff",
            "a.json",
            "b.json",
            "-s",
            "signers=id",
            "-i",
            "updatedAt",
            "--missing-identifier",
            "whole-item",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.schema.identifier_for("signers"), Some("id"));
        assert!(config.is_ignored("updatedAt"));
        assert_eq!(
            config.missing_identifier,
            MissingIdentifierPolicy::WholeItem
        );
    }
}
