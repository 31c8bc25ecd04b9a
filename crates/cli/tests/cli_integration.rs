//! CLI integration tests for the convert and scan subcommands.
//!
//! Uses `assert_cmd` to spawn the `recast` binary and verify exit codes,
//! stdout/stderr content, and the files written into temp directories.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn recast() -> Command {
    cargo_bin_cmd!("recast")
}

/// Writes a legacy source file under `dir`, creating parents.
fn write_template(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    recast()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Legacy template to Jinja converter"));
}

#[test]
fn version_exits_0() {
    recast()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recast"));
}

#[test]
fn convert_requires_the_input_directory_flag() {
    recast().arg("convert").assert().failure();
}

// ──────────────────────────────────────────────
// 2. Convert subcommand
// ──────────────────────────────────────────────

#[test]
fn convert_writes_header_and_translated_body() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    let out_dir = tmp.path().join("out");
    write_template(&in_dir, "welcome.txt", "Hello %user.name;!\n");

    recast()
        .args(["convert", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found template: welcome"))
        .stdout(predicate::str::contains("Converted welcome"));

    let written = fs::read_to_string(out_dir.join("welcome.html.j2")).unwrap();
    assert!(written.starts_with("{# This file is auto-generated from legacy template on "));
    assert!(written.contains("{# Original template: welcome #}\n"));
    assert!(written.contains("{# Template variables: [user.name] #}\n"));
    assert!(written.ends_with("Hello {{ user.name }}!\n"));
}

#[test]
fn convert_only_filters_by_template_name() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    let out_dir = tmp.path().join("out");
    write_template(&in_dir, "keep.txt", "%a;");
    write_template(&in_dir, "skip.txt", "%b;");

    recast()
        .args(["convert", "--only", "keep", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("keep.html.j2").exists());
    assert!(!out_dir.join("skip.html.j2").exists());
}

#[test]
fn convert_recursive_recreates_subdirectories() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    let out_dir = tmp.path().join("out");
    write_template(&in_dir, "top.txt", "x");
    write_template(&in_dir, "sub/nested.txt", "y");

    // Without --recursive the nested template is not discovered.
    recast()
        .args(["convert", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success();
    assert!(!out_dir.join("sub/nested.html.j2").exists());

    recast()
        .args(["convert", "--recursive", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success();
    assert!(out_dir.join("top.html.j2").exists());
    assert!(out_dir.join("sub/nested.html.j2").exists());
}

#[test]
fn failing_template_exits_1_but_does_not_abort_the_batch() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    let out_dir = tmp.path().join("out");
    write_template(&in_dir, "bad.txt", "text %end; more");
    write_template(&in_dir, "good.txt", "%if;(a)x%end;");

    recast()
        .args(["convert", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to convert template bad"))
        .stderr(predicate::str::contains("stopped at byte"))
        .stdout(predicate::str::contains("1 failed"));

    assert!(
        out_dir.join("good.html.j2").exists(),
        "the good template still converts"
    );
    assert!(
        !out_dir.join("bad.html.j2").exists(),
        "no output file for the failed template"
    );
}

#[test]
fn convert_nonexistent_input_directory_exits_1() {
    let tmp = TempDir::new().unwrap();
    recast()
        .args(["convert", "--in"])
        .arg(tmp.path().join("missing"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn quiet_suppresses_progress_output() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    let out_dir = tmp.path().join("out");
    write_template(&in_dir, "page.txt", "%v;");

    recast()
        .args(["convert", "--quiet", "--in"])
        .arg(&in_dir)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(out_dir.join("page.html.j2").exists(), "files are still written");
}

// ──────────────────────────────────────────────
// 3. Scan subcommand
// ──────────────────────────────────────────────

#[test]
fn scan_reports_metadata_without_writing_files() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    write_template(&in_dir, "page.txt", "%include;base\n%apply;fmt(x)%end;%user;");

    recast()
        .args(["scan", "--in"])
        .arg(&in_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "page: 1 variable(s), 1 function(s), 1 import(s)",
        ))
        .stdout(predicate::str::contains("variables: user"))
        .stdout(predicate::str::contains("functions: fmt"))
        .stdout(predicate::str::contains("imports: base"));

    assert!(
        !in_dir.join("page.html.j2").exists(),
        "scan must not write output files"
    );
}

#[test]
fn scan_json_is_parseable_with_sorted_metadata() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    write_template(&in_dir, "page.txt", "%zebra;%alpha;");

    let output = recast()
        .args(["scan", "--output", "json", "--in"])
        .arg(&in_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["found"], 1);
    assert_eq!(doc["converted"], 1);
    assert_eq!(doc["templates"][0]["name"], "page");
    assert_eq!(doc["templates"][0]["variables"][0], "alpha");
    assert_eq!(doc["templates"][0]["variables"][1], "zebra");
}

#[test]
fn scan_json_reports_failures_and_exits_1() {
    let tmp = TempDir::new().unwrap();
    let in_dir = tmp.path().join("in");
    write_template(&in_dir, "broken.txt", "%foreach;xs;never closed");

    let output = recast()
        .args(["scan", "--output", "json", "--in"])
        .arg(&in_dir)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["failed"], 1);
    assert_eq!(doc["failures"][0]["template"], "broken");
    assert!(
        doc["failures"][0]["error"]
            .as_str()
            .unwrap()
            .contains("foreach"),
        "error names the unclosed construct: {}",
        doc["failures"][0]
    );
    assert_eq!(doc["failures"][0]["trace"][0], "document");
}
