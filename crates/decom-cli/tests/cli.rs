//! Integration tests for the `decom` binary

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Shutting down Gen 3 lowers the cost from 3000 to 2100 $/hr.
const DECOMMIT_CASE: &str = r#"{
    "buses": [{ "id": 1, "pd": 150.0 }],
    "generators": [
        { "bus": 1, "pmin": 0, "pmax": 130, "cost": { "polynomial": [10, 100] } },
        { "bus": 1, "pmin": 30, "pmax": 100, "cost": { "polynomial": [20, 200] } },
        { "bus": 1, "pmin": 40, "pmax": 100, "cost": { "polynomial": [25, 300] } }
    ]
}"#;

fn write_case(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_run_requires_case() {
    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CASE"));
}

#[test]
fn test_run_decommits_and_writes_json() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", DECOMMIT_CASE);
    let out = dir.path().join("result.json");

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("run")
        .arg(&case)
        .arg("--serial")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2100.00"))
        .stdout(predicate::str::contains("Gen 3"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["decommitted"], serde_json::json!([2]));
    assert_eq!(json["generators"][2]["status"], false);
}

#[test]
fn test_config_file_limits_stages() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", DECOMMIT_CASE);
    let config = write_case(&dir, "decom.toml", "[decommit]\nmax_stages = 0\n");

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("3000.00"));
}

#[test]
fn test_run_reports_failure_with_exit_code() {
    let dir = TempDir::new().unwrap();
    let case = write_case(
        &dir,
        "short.json",
        r#"{
            "buses": [{ "id": 1, "pd": 500.0 }],
            "generators": [{ "bus": 1, "pmin": 0, "pmax": 100, "cost": { "polynomial": [10, 0] } }]
        }"#,
    );

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("run")
        .arg(&case)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn test_toml_case_runs() {
    let dir = TempDir::new().unwrap();
    let case = write_case(
        &dir,
        "case.toml",
        r#"
        [[buses]]
        id = 1
        pd = 50.0

        [[generators]]
        bus = 1
        pmin = 0.0
        pmax = 100.0
        cost = { piecewise = [[0.0, 0.0], [100.0, 1000.0]] }
        "#,
    );

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("run")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("500.00"));
}

#[test]
fn test_cost_prints_average_at_pmin() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", DECOMMIT_CASE);

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("cost")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("AVG@PMIN"))
        // Gen 2: (200 + 20 * 30) / 30
        .stdout(predicate::str::contains("26.6667"));
}

#[test]
fn test_validate_flags_bad_limits() {
    let dir = TempDir::new().unwrap();
    let case = write_case(
        &dir,
        "bad.json",
        r#"{
            "buses": [{ "id": 1, "pd": 10.0 }],
            "generators": [{ "bus": 1, "pmin": 50, "pmax": 40, "cost": { "polynomial": [10, 0] } }]
        }"#,
    );

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("validate")
        .arg(&case)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("limits"));
}

#[test]
fn test_validate_accepts_good_case() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", DECOMMIT_CASE);

    let mut cmd = cargo_bin_cmd!("decom");
    cmd.arg("validate")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues"));
}

#[test]
fn test_missing_case_file_fails() {
    let mut cmd = cargo_bin_cmd!("decom");
    cmd.args(["run", "/nonexistent/case.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reading case"));
}
