// Regression tests for the `zenv` binary: output, exit codes and miette
// diagnostics on stderr.

mod common;

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::source_tree;

fn zenv(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("zenv").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn string_command_prints_target() {
    let dir = tempfile::tempdir().unwrap();
    zenv(dir.path())
        .args(["string", "x ==> {1, 2}"])
        .assert()
        .success()
        .stdout("x = [1, 2]\n");
}

#[test]
fn string_command_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    zenv(dir.path())
        .args(["string", "-"])
        .write_stdin("a ==> true\nzncv.[(a)]\n")
        .assert()
        .success()
        .stdout("a = True\nprint(a)\n");
}

#[test]
fn syntax_error_renders_diagnostic_and_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    zenv(dir.path())
        .args(["string", "42lol ==> 1"])
        .assert()
        .code(2)
        .stderr(contains("zenv::dialect_syntax").and(contains("invalid variable name")));
}

#[test]
fn missing_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    zenv(dir.path())
        .args(["file", "absent.zv"])
        .assert()
        .code(1)
        .stderr(contains("file not found"));
}

#[test]
fn file_command_writes_next_to_input() {
    let dir = source_tree(&[("hello.zv", "name ==> 'Ada'\nzncv.[('Hi $s' $name)]\n")]);
    zenv(dir.path())
        .args(["file", "hello.zv"])
        .assert()
        .success()
        .stdout(contains("hello.py"));
    assert_eq!(
        fs::read_to_string(dir.path().join("hello.py")).unwrap(),
        "name = 'Ada'\nprint(f'Hi {name}')\n"
    );
}

#[test]
fn file_command_stdout_writes_nothing() {
    let dir = source_tree(&[("a.zv", "numbers:apend[(4)]\n")]);
    zenv(dir.path())
        .args(["file", "a.zv", "--stdout"])
        .assert()
        .success()
        .stdout("numbers.append(4)\n");
    assert!(!dir.path().join("a.py").exists());
}

#[test]
fn file_check_reports_target_errors() {
    let dir = source_tree(&[("ok.zv", "x ==> 1\n"), ("bad.zv", "x ==> 1\nfoo(\n")]);
    zenv(dir.path())
        .args(["file", "ok.zv", "--check"])
        .assert()
        .success()
        .stdout(contains("is valid"));
    zenv(dir.path())
        .args(["file", "bad.zv", "--check"])
        .assert()
        .code(2)
        .stderr(contains("zenv::target_parse"));
    assert!(!dir.path().join("ok.py").exists());
}

#[test]
fn dir_command_writes_into_configured_output_dir() {
    let dir = source_tree(&[("a.zv", "a ==> 1\n"), ("b.zv", "b ==> 2\n")]);
    zenv(dir.path())
        .args(["dir", "."])
        .assert()
        .success()
        .stdout(contains("transpiled: 2"));
    assert!(dir.path().join("transpiled/a.py").is_file());
    assert!(dir.path().join("transpiled/b.py").is_file());
}

#[test]
fn dir_command_json_reports_failures_and_exits_2() {
    let dir = source_tree(&[("good.zv", "x ==> 1\n"), ("bad.zv", "42lol ==> 1\n")]);
    let out = dir.path().join("out");
    let assert = zenv(dir.path())
        .args(["dir", ".", "--json", "-j", "1", "-o"])
        .arg(&out)
        .assert()
        .code(2);

    let json: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["transpiled"], 1);
    assert_eq!(json["errors"], 1);
    assert_eq!(json["failures"][0]["line"], 1);
    assert!(json["failures"][0]["path"]
        .as_str()
        .unwrap()
        .ends_with("bad.zv"));
    assert!(out.join("good.py").is_file());
}

#[test]
fn dir_command_on_a_file_exits_1() {
    let dir = source_tree(&[("a.zv", "a ==> 1\n")]);
    zenv(dir.path())
        .args(["dir", "a.zv"])
        .assert()
        .code(1)
        .stderr(contains("not a directory"));
}

#[test]
fn rules_command_lists_rules_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let assert = zenv(dir.path()).arg("rules").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let import = stdout.find("import").unwrap();
    let assignment = stdout.find("assignment").unwrap();
    assert!(import < assignment);
    assert!(stdout.contains("numbers:apend[(4)]  =>  numbers.append(4)"));
}

#[test]
fn config_file_changes_extensions() {
    let dir = source_tree(&[
        ("zenv.yaml", "extensions: [dlx]\noutput_dir: build\n"),
        ("a.dlx", "a ==> 1\n"),
        ("b.zv", "b ==> 2\n"),
    ]);
    zenv(dir.path())
        .args(["dir", "."])
        .assert()
        .success()
        .stdout(contains("files:      1"));
    assert!(dir.path().join("build/a.py").is_file());
    assert!(!dir.path().join("build/b.py").exists());
}

#[test]
fn invalid_config_is_reported() {
    let dir = source_tree(&[("zenv.yaml", "colour: blue\n")]);
    zenv(dir.path())
        .args(["string", "x ==> 1"])
        .assert()
        .failure()
        .stderr(contains("zenv.yaml").or(contains("colour")));
}
