//! Corruption recovery tests for runlog.
//!
//! These tests verify the system can handle:
//! - Corrupted workout and settings files
//! - Well-formed JSON of the wrong shape
//! - Individual bad records inside a good collection

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("runlog"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_workouts_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("runTracker.workouts.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted workouts");

    cli()
        .arg("stats")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total runs:     0"));

    // The next write replaces the unreadable value
    cli()
        .args(["add", "--date", "2024-05-01", "--distance", "5", "--duration", "30"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("runTracker.workouts.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 1);
}

#[test]
fn test_workouts_value_not_an_array() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("runTracker.workouts.json"),
        r#"{"date":"2024-05-01","distance":5,"duration":30}"#,
    )
    .unwrap();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs logged yet"));
}

#[test]
fn test_bad_records_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("runTracker.workouts.json"),
        r#"[
            {"date":"2024-05-01","distance":5,"duration":30,"type":"Tempo","kudos":2},
            {"date":"2024-05-02","distance":"far"},
            42
        ]"#,
    )
    .unwrap();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] 2024-05-01"))
        .stdout(predicate::str::contains("2024-05-02").not());
}

#[test]
fn test_corrupted_settings_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("runTracker.settings.json"), "not json at all").unwrap();

    cli()
        .arg("settings")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Theme: light"))
        .stdout(predicate::str::contains("Units: metric"));
}

#[test]
fn test_missing_data_dir_is_created_on_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested/runlog");

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
    assert!(!data_dir.exists());

    cli()
        .args(["add", "--date", "2024-05-01", "--distance", "5", "--duration", "30"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
    assert!(data_dir.join("runTracker.workouts.json").exists());
}
