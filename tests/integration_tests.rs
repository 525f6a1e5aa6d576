//! Integration tests for the qtl CLI
//!
//! Each test drives the binary end-to-end against its own data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CASES_CSV: &str = "\
用例ID,测试场景,测试步骤,预期结果,优先级
TC-001,用户登录,\"1. 打开页面
2. 输入密码\",登录成功,P0
TC-002,用户退出,点击退出,返回首页,P1
";

/// Helper to get a qtl command bound to a data directory
fn qtl(data: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("qtl").unwrap();
    cmd.arg("--data-dir")
        .arg(data.path())
        .env_remove("QTL_DATA_DIR")
        .env_remove("QTL_REMOTE_URL")
        .env("QTL_EXECUTOR", "tester")
        .env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Data dir with the two sample cases imported into collection "Sprint 1"
fn setup_with_cases() -> TempDir {
    let data = TempDir::new().unwrap();
    let csv = write_file(data.path(), "cases.csv", CASES_CSV);
    qtl(&data)
        .arg("import")
        .arg(&csv)
        .args(["--collection", "Sprint 1", "--no-input"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2/2"));
    data
}

fn new_record(data: &TempDir, case_id: &str, status: &str) -> String {
    let output = qtl(data)
        .args(["-f", "id", "record", "new", case_id, "--status", status])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_displays() {
    let data = TempDir::new().unwrap();
    qtl(&data)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("QA Test Logger"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_completions_bash() {
    let data = TempDir::new().unwrap();
    qtl(&data)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qtl"));
}

#[test]
fn test_fresh_data_dir_creates_database() {
    let data = TempDir::new().unwrap();
    qtl(&data)
        .args(["case", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No test cases found"));
    assert!(data.path().join("qa_test_logger.db").exists());
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_template_prints_headers() {
    let data = TempDir::new().unwrap();
    qtl(&data)
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::contains("用例ID"))
        .stdout(predicate::str::contains("预期结果"));
}

#[test]
fn test_import_lists_cases_in_order() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["-f", "id", "case", "list"])
        .assert()
        .success()
        .stdout("TC-001\nTC-002\n");
}

#[test]
fn test_import_missing_columns_reports_all() {
    let data = TempDir::new().unwrap();
    let csv = write_file(data.path(), "bad.csv", "测试场景,优先级\n登录,P0\n");
    qtl(&data)
        .args(["import", "--no-input"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("用例ID"))
        .stderr(predicate::str::contains("预期结果"));
}

#[test]
fn test_import_duplicate_ids_writes_nothing() {
    let data = TempDir::new().unwrap();
    let csv = write_file(
        data.path(),
        "dup.csv",
        "用例ID,测试场景,预期结果\nTC-1,a,b\nTC-1,c,d\n",
    );
    qtl(&data)
        .args(["import", "--no-input"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TC-1"));

    qtl(&data)
        .args(["-f", "id", "case", "list"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_reimport_infers_collection() {
    let data = setup_with_cases();
    let csv = write_file(
        data.path(),
        "more.csv",
        "case_id,scenario,expected_result\nTC-002,用户退出(改),返回首页\nTC-003,新场景,成功\n",
    );
    qtl(&data)
        .args(["import", "--no-input"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint 1"));

    let output = qtl(&data)
        .args(["-f", "id", "case", "list", "--collection", "Sprint 1"])
        .output()
        .unwrap();
    let mut ids: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect();
    ids.sort();
    assert_eq!(ids, ["TC-001", "TC-002", "TC-003"]);
}

#[test]
fn test_collection_list_and_delete() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["-f", "csv", "collection", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint 1,2"));

    qtl(&data)
        .args(["collection", "delete", "Sprint 1", "--yes"])
        .assert()
        .success();

    qtl(&data)
        .args(["-f", "id", "case", "list"])
        .assert()
        .success()
        .stdout("");
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_new_and_show() {
    let data = setup_with_cases();
    let id = new_record(&data, "TC-001", "failed");
    assert!(!id.is_empty());

    qtl(&data)
        .args(["-f", "json", "record", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"failed\""))
        .stdout(predicate::str::contains("\"executor\": \"tester\""));
}

#[test]
fn test_record_accepts_stored_labels() {
    let data = setup_with_cases();
    let id = new_record(&data, "TC-002", "通过");
    qtl(&data)
        .args(["-f", "json", "record", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"passed\""));
}

#[test]
fn test_record_for_unknown_case_fails() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["record", "new", "TC-999", "--status", "passed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TC-999"));
}

#[test]
fn test_record_rejects_unknown_status() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["record", "new", "TC-001", "--status", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown status"));
}

#[test]
fn test_record_images_attach_and_clear() {
    let data = setup_with_cases();
    let shot = write_file(data.path(), "shot.png", "png-bytes");

    let output = qtl(&data)
        .args(["-f", "id", "record", "new", "TC-001", "--status", "failed", "--image"])
        .arg(&shot)
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();

    qtl(&data)
        .args(["-f", "json", "record", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("TC-001_"));
    assert!(data.path().join("images").is_dir());

    qtl(&data)
        .args(["record", "update", &id, "--clear-images", "--notes", "retested"])
        .assert()
        .success();

    qtl(&data)
        .args(["-f", "json", "record", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"images\": []"))
        .stdout(predicate::str::contains("retested"));
}

#[test]
fn test_update_missing_record_fails() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["record", "update", "42", "--status", "passed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_case_delete_removes_history() {
    let data = setup_with_cases();
    new_record(&data, "TC-001", "failed");
    new_record(&data, "TC-001", "passed");

    qtl(&data)
        .args(["case", "delete", "TC-001", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 record(s)"));

    qtl(&data)
        .args(["-f", "id", "history", "--case", "TC-001"])
        .assert()
        .success()
        .stdout("");
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_history_filters_by_status_and_search() {
    let data = setup_with_cases();
    let failed = new_record(&data, "TC-001", "failed");
    new_record(&data, "TC-002", "passed");

    qtl(&data)
        .args(["-f", "id", "history", "--status", "failed"])
        .assert()
        .success()
        .stdout(format!("{}\n", failed));

    qtl(&data)
        .args(["-f", "id", "history", "--search", "登录"])
        .assert()
        .success()
        .stdout(format!("{}\n", failed));

    qtl(&data)
        .args(["-f", "id", "history", "--search", "tc-00"])
        .assert()
        .success()
        .stdout(predicate::str::contains(failed.as_str()));
}

#[test]
fn test_history_rejects_malformed_date() {
    let data = setup_with_cases();
    qtl(&data)
        .args(["history", "--from", "2024/01/01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2024/01/01"));
}

#[test]
fn test_stats_counts_and_rate() {
    let data = setup_with_cases();
    new_record(&data, "TC-001", "failed");
    new_record(&data, "TC-002", "passed");

    qtl(&data)
        .args(["-f", "csv", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2,1,1,0,0,50.0"));
}

#[test]
fn test_stats_empty_store() {
    let data = TempDir::new().unwrap();
    qtl(&data)
        .args(["-f", "csv", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0,0,0,0,0,0.0"));
}

#[test]
fn test_latest_picks_newest_record() {
    let data = setup_with_cases();
    new_record(&data, "TC-001", "failed");
    let newest = new_record(&data, "TC-001", "passed");

    qtl(&data)
        .args(["-f", "id", "latest"])
        .assert()
        .success()
        .stdout(format!("{}\n", newest));
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_report_csv_written_with_headers() {
    let data = setup_with_cases();
    new_record(&data, "TC-001", "failed");
    let out = data.path().join("out").join("report.csv");

    qtl(&data)
        .arg("report")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written"));

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("用例ID,测试场景"));
    assert!(content.contains("TC-001"));
    assert!(content.contains("失败"));
}

#[test]
fn test_report_markdown_with_images() {
    let data = setup_with_cases();
    let shot = write_file(data.path(), "shot.png", "png-bytes");
    qtl(&data)
        .args(["record", "new", "TC-002", "--status", "blocked", "--image"])
        .arg(&shot)
        .assert()
        .success();
    let out = data.path().join("report.md");

    qtl(&data)
        .arg("report")
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.contains("TC-002"));
    assert!(content.contains("report_images/"));
    assert!(data.path().join("report_images").is_dir());
}

#[test]
fn test_report_without_matches_fails_and_leaves_nothing() {
    let data = setup_with_cases();
    let out = data.path().join("empty.csv");

    qtl(&data)
        .arg("report")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no records match"));
    assert!(!out.exists());
}
