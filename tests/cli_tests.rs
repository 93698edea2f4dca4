//! Integration tests for the mes-view CLI
//!
//! These tests run the actual CLI binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the binary to test
fn mes_cmd() -> Command {
    Command::cargo_bin("mes-view").unwrap()
}

const MODEL: &str = r#"
plugin: basic
entities:
  company:
    fields:
      name: string
      country: { belongsTo: country }
  country:
    fields:
      code: string
"#;

const VIEW: &str = r##"
plugin: basic
name: companyDetails
model: company
components:
  - name: window
    type: window
    children:
      - name: form
        type: form
        reference: form
        children:
          - name: code
            type: input
            reference: code
            field: "#{country}.code"
          - name: name
            type: input
            field: name
          - name: country
            type: lookup
            reference: country
            field: country
"##;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_flag() {
    mes_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve component dependencies"));
}

#[test]
fn test_check_help() {
    mes_cmd()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--model"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_valid_view() {
    let temp_dir = TempDir::new().unwrap();
    let model = write(temp_dir.path(), "model.yaml", MODEL);
    let view = write(temp_dir.path(), "company.view.yaml", VIEW);

    mes_cmd()
        .arg("check")
        .arg(&view)
        .arg("--model")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("View 'basic.companyDetails' is valid"))
        .stdout(predicate::str::contains("Passes: 2"))
        .stdout(predicate::str::contains("Initialization order"))
        .stdout(predicate::str::contains("Listeners"));
}

#[test]
fn test_check_cycle_fails_with_fix() {
    let temp_dir = TempDir::new().unwrap();
    let view = write(
        temp_dir.path(),
        "cycle.view.yaml",
        r##"
plugin: basic
name: cycle
components:
  - name: a
    type: input
    field: "#{b}"
  - name: b
    type: input
    field: "#{a}"
"##,
    );

    mes_cmd()
        .arg("check")
        .arg(&view)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MES-024"))
        .stderr(predicate::str::contains("a → b → a"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_check_missing_model_entity() {
    let temp_dir = TempDir::new().unwrap();
    let view = write(temp_dir.path(), "company.view.yaml", VIEW);

    mes_cmd()
        .arg("check")
        .arg(&view)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MES-013"))
        .stderr(predicate::str::contains("--model"));
}

#[test]
fn test_check_nonexistent_file() {
    mes_cmd()
        .args(["check", "/nonexistent/path/view.view.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read view file"));
}

// ============================================================================
// render
// ============================================================================

#[test]
fn test_render_outputs_json() {
    let temp_dir = TempDir::new().unwrap();
    let model = write(temp_dir.path(), "model.yaml", MODEL);
    let view = write(temp_dir.path(), "company.view.yaml", VIEW);

    let output = mes_cmd()
        .arg("render")
        .arg(&view)
        .args(["-m", model.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "companyDetails");
    let form = &json["components"][0]["children"][0];
    assert_eq!(form["translationPath"], "basic.companyDetails.window.form");
    let country = &form["children"][2];
    assert_eq!(country["dataScope"], "basic.country");
    assert_eq!(
        country["jsOptions"]["listeners"],
        serde_json::json!(["window.form.code"])
    );
}

// ============================================================================
// scan
// ============================================================================

#[test]
fn test_scan_reports_each_view() {
    let temp_dir = TempDir::new().unwrap();
    let model = write(temp_dir.path(), "model.yaml", MODEL);
    write(temp_dir.path(), "views/company.view.yaml", VIEW);
    write(
        temp_dir.path(),
        "views/nested/broken.view.yaml",
        r##"
plugin: basic
name: broken
components:
  - name: a
    type: input
    field: "#{missing}"
"##,
    );
    write(temp_dir.path(), "views/notes.yaml", "not a view");

    mes_cmd()
        .arg("scan")
        .arg(temp_dir.path().join("views"))
        .arg("--model")
        .arg(&model)
        .assert()
        .failure()
        .stdout(predicate::str::contains("company.view.yaml (5 components)"))
        .stdout(predicate::str::contains("MES-021"))
        .stdout(predicate::str::contains("2 views, 1 failed"));
}
