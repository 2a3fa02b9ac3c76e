//! CLI integration tests: run the xreftool binary to cover main.rs branches.
//! Uses CARGO_BIN_EXE_xreftool when cargo provides it.

mod common;

use std::path::PathBuf;
use std::process::Command;

fn bin() -> Option<PathBuf> {
    option_env!("CARGO_BIN_EXE_xreftool")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("CARGO_BIN_EXE_xreftool").map(PathBuf::from))
}

fn write_workspace(dir: &tempfile::TempDir, value: serde_json::Value) -> PathBuf {
    let path = dir.path().join("workspace.json");
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

#[test]
fn test_cli_help_succeeds() {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return;
    };
    let out = Command::new(bin).arg("--help").output().expect("run --help");
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("xreftool"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("graph"));
}

#[test]
fn test_cli_fails_on_missing_workspace() {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return;
    };
    let out = Command::new(&bin)
        .args(["build", "nonexistent_workspace_12345.json", "--project", "app"])
        .output()
        .expect("run build with missing workspace");
    assert!(!out.status.success(), "expected failure when workspace missing");
}

#[test]
fn test_cli_build_json() {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let workspace = write_workspace(&dir, common::fixtures::scenario());

    let out = Command::new(&bin)
        .arg("build")
        .arg(&workspace)
        .args(["--project", "app", "--json"])
        .output()
        .expect("run build");
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    assert_eq!(json["report"]["status"], "completed");
    assert_eq!(json["report"]["edges"], 1);
    assert_eq!(json["model"]["edge_count"], 1);
    assert_eq!(json["diagnostics"]["annotations"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_build_text_and_graph() {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let workspace = write_workspace(&dir, common::fixtures::scenario());

    let out = Command::new(&bin)
        .arg("build")
        .arg(&workspace)
        .args(["--project", "app", "--files", "beans.xml"])
        .output()
        .expect("run build");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("completed"));
    assert!(stdout.contains("advised by Asp.log()"));

    let out = Command::new(&bin)
        .arg("graph")
        .arg(&workspace)
        .args(["--project", "app"])
        .output()
        .expect("run graph");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("digraph"));
}

#[test]
fn test_cli_unknown_project_fails() {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let workspace = write_workspace(&dir, common::fixtures::scenario());
    let out = Command::new(&bin)
        .arg("build")
        .arg(&workspace)
        .args(["--project", "missing"])
        .output()
        .expect("run build");
    assert!(!out.status.success());
}
