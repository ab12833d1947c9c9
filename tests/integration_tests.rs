//! Integration tests for the recdiff CLI.
//!
//! These tests run the binary end to end: argument parsing, configuration
//! loading, document parsing, comparison and output formatting.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Helper to create a Command for the recdiff binary
fn recdiff() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("recdiff"))
}

#[test]
fn test_identical_records_exit_0() {
    recdiff()
        .arg("tests/fixtures/identical_1.json")
        .arg("tests/fixtures/identical_2.json")
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_changed_records_exit_1() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .arg("--config")
        .arg("tests/fixtures/kyc_schema.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("companyName"))
        .stdout(predicate::str::contains("Summary"));
}

#[test]
fn test_file_not_found_exit_2() {
    recdiff()
        .arg("tests/fixtures/nonexistent.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_plain_output_lines() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["-c", "tests/fixtures/kyc_schema.json", "-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "• companyName: \"Swaniawski Group\" → \"Swaniawski Group Ltd\"",
        ))
        .stdout(predicate::str::contains("+ tags[]: \"wholesale\""))
        .stdout(predicate::str::contains("- tags[]: \"retail\""))
        .stdout(predicate::str::contains(
            "- registeredAddress.postalCode: \"1100-148\"",
        ))
        .stdout(predicate::str::contains(
            "• otherSignatoryInfo[Wade Hills].role: \"Director\" → \"Managing Director\"",
        ))
        .stdout(predicate::str::contains(
            "+ otherSignatoryInfo[Lena Fritsch]: { 3 keys }",
        ))
        .stdout(predicate::str::contains("Ada Kirlin").not())
        .stdout(predicate::str::contains("updatedAt").not())
        .stdout(predicate::str::contains(
            "Summary: 2 added, 4 removed, 2 modified",
        ));
}

#[test]
fn test_missing_identifier_exit_2() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("otherSignatoryInfo"));
}

#[test]
fn test_schema_flag() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["-s", "otherSignatoryInfo=name", "-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("otherSignatoryInfo[Lena Fritsch]"))
        .stdout(predicate::str::contains("updatedAt"));
}

#[test]
fn test_ignore_flag() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["-s", "otherSignatoryInfo=name", "-i", "updatedAt", "-i", "role"])
        .args(["-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("updatedAt").not())
        .stdout(predicate::str::contains("role").not())
        .stdout(predicate::str::contains("+ otherSignatoryInfo[Lena Fritsch]"));
}

#[test]
fn test_whole_item_policy() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["--missing-identifier", "whole-item", "-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("+ otherSignatoryInfo[]"))
        .stdout(predicate::str::contains("- otherSignatoryInfo[]"));
}

#[test]
fn test_toml_config() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["--config", "tests/fixtures/kyc_schema.toml", "-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Summary: 2 added, 4 removed, 2 modified",
        ));
}

#[test]
fn test_invalid_config_exit_2() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["--config", "tests/fixtures/bad_schema.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_json_and_yaml_versions() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.yaml")
        .args(["-c", "tests/fixtures/kyc_schema.json", "-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Summary: 2 added, 4 removed, 2 modified",
        ));
}

#[test]
fn test_json_output_envelope() {
    let output = recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["-c", "tests/fixtures/kyc_schema.json", "--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["message"], "Successfully found difference");
    assert_eq!(
        json["data"]["companyName"],
        serde_json::json!({
            "mannerOfChange": "MODIFICATION",
            "initialValue": "Swaniawski Group",
            "latestValue": "Swaniawski Group Ltd"
        })
    );
    assert_eq!(
        json["data"]["registeredAddress"]["city"],
        serde_json::json!({
            "mannerOfChange": "DELETION",
            "initialValue": "Lisbon",
            "latestValue": "-"
        })
    );
    assert_eq!(
        json["data"]["otherSignatoryInfo"][1]["arrayItemIdentifier"],
        "Lena Fritsch"
    );
}

#[test]
fn test_json_error_envelope() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["--format", "json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"status\": \"ERROR\""))
        .stdout(predicate::str::contains("Comparison failed"));
}

#[test]
fn test_invalid_json_exit_2() {
    recdiff()
        .arg("tests/fixtures/invalid.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_array_root_exit_2() {
    recdiff()
        .arg("tests/fixtures/array_root.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("found array"));
}

#[test]
fn test_stdin_input() {
    recdiff()
        .arg("-")
        .arg("tests/fixtures/identical_1.json")
        .write_stdin(r#"{"kycId": "KYC-2001", "companyName": "Hartmann Traders"}"#)
        .args(["-f", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("+ registeredAddress.city: \"Dublin\""));
}

#[test]
fn test_both_stdin_rejected() {
    recdiff()
        .arg("-")
        .arg("-")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stdin"));
}

#[test]
fn test_quiet_mode() {
    recdiff()
        .arg("tests/fixtures/kyc_previous.json")
        .arg("tests/fixtures/kyc_latest.json")
        .args(["-c", "tests/fixtures/kyc_schema.json", "-f", "plain", "--quiet"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("companyName"))
        .stdout(predicate::str::contains("Summary").not());
}

#[test]
fn test_verbose_mode() {
    recdiff()
        .arg("tests/fixtures/identical_1.json")
        .arg("tests/fixtures/identical_2.json")
        .arg("--verbose")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsing"))
        .stderr(predicate::str::contains("Computing diff"));
}

#[test]
fn test_max_value_length() {
    let mut previous = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let mut latest = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    writeln!(previous, r#"{{"note": "{}"}}"#, "a".repeat(60)).unwrap();
    writeln!(latest, r#"{{"note": "{}"}}"#, "b".repeat(60)).unwrap();

    recdiff()
        .arg(previous.path())
        .arg(latest.path())
        .args(["-f", "plain", "--max-value-length", "10"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"aaaaaa..."))
        .stdout(predicate::str::contains("a".repeat(20)).not());
}

#[test]
fn test_help() {
    recdiff()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Structural diff"));
}

#[test]
fn test_version() {
    recdiff()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recdiff"));
}
