//! CLI integration tests for chronobill
//!
//! Tests the chronobill CLI commands end-to-end using assert_cmd, with the
//! config and database redirected into a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a command sandboxed into a temp directory
fn chronobill_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chronobill").unwrap();
    cmd.env("CHRONOBILL_CONFIG_DIR", dir.path().join("config"));
    cmd.env("CHRONOBILL_DB", dir.path().join("chronobill.db"));
    cmd
}

/// Run a command with --format json and parse its stdout
fn json_output(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = chronobill_cmd(dir)
        .args(args)
        .arg("--format")
        .arg("json")
        .output()
        .expect("run command");
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("parse json output")
}

#[test]
fn test_doctor_reports_healthy_database() {
    let dir = TempDir::new().unwrap();
    chronobill_cmd(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database: ok"));
}

#[test]
fn test_entry_is_rounded_under_project_policy() {
    let dir = TempDir::new().unwrap();

    let project = json_output(
        &dir,
        &[
            "project", "add", "Portal", "--granularity", "0.25", "--method", "up", "--factor",
            "200",
        ],
    );
    let project_id = project["id"].as_str().expect("project id");

    let entry = json_output(
        &dir,
        &["entry", "add", "API work", "1.0", "--project", project_id],
    );
    assert_eq!(entry["amount"].as_f64(), Some(1.0));
    assert_eq!(entry["amount_rounded"].as_f64(), Some(2.0));
}

#[test]
fn test_entry_list_presents_raw_or_rounded() {
    let dir = TempDir::new().unwrap();

    let project = json_output(&dir, &["project", "add", "Portal", "--factor", "200"]);
    let project_id = project["id"].as_str().expect("project id");
    json_output(&dir, &["entry", "add", "work", "1.0", "--project", project_id]);

    let raw = json_output(&dir, &["entry", "list", "--project", project_id]);
    assert_eq!(raw[0]["hours"].as_f64(), Some(1.0));

    let rounded = json_output(
        &dir,
        &["entry", "list", "--project", project_id, "--rounded"],
    );
    assert_eq!(rounded[0]["hours"].as_f64(), Some(2.0));
}

#[test]
fn test_report_aggregates_rounded_hours() {
    let dir = TempDir::new().unwrap();

    let project = json_output(&dir, &["project", "add", "Portal", "--factor", "200"]);
    let project_id = project["id"].as_str().expect("project id");
    json_output(&dir, &["entry", "add", "a", "1.0", "--project", project_id]);
    json_output(&dir, &["entry", "add", "b", "0.9", "--project", project_id]);

    let report = json_output(&dir, &["report", "--project", project_id, "--rounded"]);
    assert_eq!(report[0]["entry_count"].as_i64(), Some(2));
    assert_eq!(report[0]["hours"].as_f64(), Some(4.0));
}

#[test]
fn test_order_line_tracks_delivered_quantity() {
    let dir = TempDir::new().unwrap();

    let project = json_output(&dir, &["project", "add", "Portal", "--factor", "200"]);
    let project_id = project["id"].as_str().expect("project id");
    let line = json_output(&dir, &["order-line", "add", "SO0001", project_id, "3.0"]);
    let line_id = line["id"].as_str().expect("line id");

    json_output(&dir, &["entry", "add", "work", "1.0", "--project", project_id]);

    chronobill_cmd(&dir)
        .args(["order-line", "show", line_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("delivered: 2h"));
}

#[test]
fn test_invoicing_factor_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();

    chronobill_cmd(&dir)
        .args(["project", "add", "Bad", "--factor", "600"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 500"));
}

#[test]
fn test_unknown_rounding_method_is_rejected() {
    let dir = TempDir::new().unwrap();

    chronobill_cmd(&dir)
        .args(["project", "add", "Bad", "--method", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown rounding method"));
}
