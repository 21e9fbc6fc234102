//! Integration tests for CLI argument handling
//!
//! Tests code type validation, filter rules, and the exit status when the
//! codes service cannot be reached.

use std::process::Command;

/// Port 9 (discard) is closed on test machines, so connections are refused
const UNREACHABLE_HOST: &str = "http://127.0.0.1:9";

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wqcodes"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute wqcodes")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wqcodes"), "Help should mention wqcodes");
    assert!(stdout.contains("--filter"), "Help should mention --filter");
    assert!(stdout.contains("--duration"), "Help should mention --duration");
}

#[test]
fn test_missing_code_type_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_code_type_prints_error_and_exits() {
    let output = run_cli(&["aquifer"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid code type") && stderr.contains("aquifer"),
        "Should print error message about invalid code type: {}",
        stderr
    );
}

#[test]
fn test_county_args_without_county_lookup_fail() {
    let output = run_cli(&["state", "--country", "US"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("only apply to county"), "{}", stderr);
}

#[test]
fn test_unreachable_host_reports_unavailable() {
    let output = run_cli(&["--host", UNREACHABLE_HOST, "state", "--filter", "US"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no state codes available"),
        "Should report missing content: {}",
        stderr
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unreachable_host_json_envelope() {
    let output = run_cli(&["--host", UNREACHABLE_HOST, "--json", "country"]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("stdout should be one JSON object");
    assert_eq!(value["code_type"], "country");
    assert_eq!(value["source"], "unavailable");
    assert_eq!(value["url"], "http://127.0.0.1:9/Codes/countrycode");
}
