//! Integration tests for the sprout CLI

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const UNIVERSE: &str = r#"{
    "packages": [
        {"name": "a", "version": "1.0"},
        {"name": "a", "version": "2.0", "depends": [
            {"simple": {"name": "b", "requirement": {"range": ">=3.0"}}}
        ]},
        {"name": "b", "version": "2.0"},
        {"name": "x", "version": "1.0", "excluded": "yanked upstream"}
    ]
}"#;

fn universe_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create universe file");
    file.write_all(UNIVERSE.as_bytes())
        .expect("Failed to write universe file");
    file
}

fn sprout(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sprout"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute sprout")
}

#[test]
fn test_cli_version() {
    let output = sprout(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sprout"));
}

#[test]
fn test_cli_help() {
    let output = sprout(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dependency solver for flagged package universes"));
    assert!(stdout.contains("solve"));
    assert!(stdout.contains("index"));
}

#[test]
fn test_solve_plain() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["solve", path, "a"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a-1.0.0"));
    assert!(!stdout.contains("b-2.0.0"));
}

#[test]
fn test_solve_json() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["--json", "solve", path, "a"]);
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = plan["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["qpn"]["name"], "a");
}

#[test]
fn test_solve_failure_explains() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["solve", path, "x"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("could not resolve dependencies"));
    assert!(stdout.contains("yanked upstream"));
}

#[test]
fn test_solve_constraint_forces_failure() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["solve", path, "a", "--constraint", "a>=2.0"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a-1.0.0 rejected: user constraint"));
    assert!(stdout.contains("a-2.0.0 requires b"));
}

#[test]
fn test_unknown_target_is_error() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["solve", path, "nope"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown target package: nope"));
}

#[test]
fn test_invalid_constraint_is_error() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["solve", path, "a", "-c", "a sideways"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid constraint"));
}

#[test]
fn test_index_listing() {
    let file = universe_file();
    let path = file.path().to_str().unwrap();

    let output = sprout(&["index", path]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 packages, 4 instances"));
    assert!(stdout.contains("x-1.0.0 [excluded: yanked upstream]"));
}
