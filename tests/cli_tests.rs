//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn bsync_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bsync"))
}

fn fixture_schema() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("BuildingSync.xsd");
    path
}

// ============================================================================
// Generate Command Tests
// ============================================================================

#[test]
fn test_cli_generate_writes_module() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("bsync.json");

    let output = Command::new(bsync_bin())
        .args(["generate", fixture_schema().to_str().unwrap(), "-o", out.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "generate should succeed");
    let json = std::fs::read_to_string(&out).unwrap();
    let registry = bsync::ClassRegistry::from_json(&json).unwrap();
    assert_eq!(registry.root(), "BuildingSync");
}

#[test]
fn test_cli_generate_unknown_root() {
    let output = Command::new(bsync_bin())
        .args(["generate", fixture_schema().to_str().unwrap(), "--root", "Campus"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "unknown root should fail");
    assert!(stderr.contains("Campus"), "should name the missing root");
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect_summary() {
    let output = Command::new(bsync_bin())
        .args(["inspect", fixture_schema().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "inspect should succeed");
    assert!(stdout.contains("Root Element: BuildingSync"));
    assert!(stdout.contains(bsync::BUILDINGSYNC_NAMESPACE));
    assert!(stdout.contains("Facilities.Facility"));
}

#[test]
fn test_cli_inspect_class_json() {
    let output = Command::new(bsync_bin())
        .args(["inspect", "--class", "Facility", "--json", fixture_schema().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "inspect --class should succeed");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["alias"], "Facility");
    assert_eq!(json["def"]["name"], "Facilities.Facility");
}

#[test]
fn test_cli_inspect_class_details() {
    let output = Command::new(bsync_bin())
        .args(["inspect", "--class", "Facility", fixture_schema().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "inspect --class should succeed");
    assert!(stdout.contains("Class: Facilities.Facility"));
    assert!(stdout.contains("Content: element-only"));
}

#[test]
fn test_cli_inspect_unknown_class() {
    let output = Command::new(bsync_bin())
        .args(["inspect", "--class", "Skyscraper", fixture_schema().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "unknown class should fail");
}
