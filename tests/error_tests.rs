use recdiff::{DiffError, OutputError, ParseError, RecdiffError};
use std::error::Error;

#[test]
fn test_parse_error_display() {
    let err = ParseError::file_not_found("test.json");
    assert_eq!(err.to_string(), "File not found: test.json");
}

#[test]
fn test_unknown_format_error() {
    let err = ParseError::unknown_format("/path/to/file.txt");
    assert!(err.to_string().contains("Could not detect file format"));
    assert!(err.to_string().contains("/path/to/file.txt"));
}

#[test]
fn test_diff_error_display() {
    assert_eq!(
        DiffError::circular_reference("store.address.postalCode").to_string(),
        "Circular reference detected at store.address.postalCode"
    );
    assert_eq!(
        DiffError::missing_identifier("otherUboInfo").to_string(),
        "No array item identifier configured for field 'otherUboInfo'"
    );
    assert_eq!(
        DiffError::malformed_input("latest", "array").to_string(),
        "Expected latest document to be an object, found array"
    );
}

#[test]
fn test_output_error_has_source() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = OutputError::JsonSerializationError { source };
    assert!(err.to_string().starts_with("Failed to serialize to JSON"));
    assert!(err.source().is_some());
}

#[test]
fn test_recdiff_error_from_parse_error() {
    let parse_err = ParseError::file_not_found("test.json");
    let err: RecdiffError = parse_err.into();
    assert!(matches!(err, RecdiffError::Parse(_)));
    assert_eq!(err.to_string(), "File not found: test.json");
}

#[test]
fn test_recdiff_error_from_diff_error() {
    let err: RecdiffError = DiffError::missing_identifier("signers").into();
    assert!(matches!(err, RecdiffError::Diff(_)));
    assert!(err.to_string().contains("signers"));
}

#[test]
fn test_config_error() {
    let err = RecdiffError::config("Invalid option");
    assert!(matches!(err, RecdiffError::ConfigError { .. }));
    assert_eq!(err.to_string(), "Invalid configuration: Invalid option");
}
