//! CLI interface tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn cmd() -> Command {
    Command::cargo_bin("gitolite-conf").unwrap()
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gitolite-conf"));
}

#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Check, normalize and inspect gitolite-admin configuration",
        ));
}

#[test]
fn test_check_fixture() {
    cmd()
        .arg("check")
        .arg(fixtures().join("configs/complicated.conf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("6 repos, 5 groups"))
        .stdout(predicate::str::contains("group order: "));
}

#[test]
fn test_missing_config_error() {
    cmd()
        .args(["check", "nonexistent.conf"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_parse_error_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gitolite.conf");
    fs::write(&config_path, "repo foo\n  RW+ = bob\nwhat is this\n").unwrap();

    cmd()
        .arg("check")
        .arg(&config_path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn test_cyclic_groups_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gitolite.conf");
    fs::write(&config_path, "@a = @b\n@b = @a\n").unwrap();

    cmd()
        .arg("check")
        .arg(&config_path)
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_format_to_output_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gitolite.conf");
    fs::write(&config_path, "repo foo\nRW+=bob\n@staff=alice\n").unwrap();
    let out_dir = temp_dir.path().join("out");

    cmd()
        .arg("format")
        .arg(&config_path)
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("gitolite.conf"));

    let written = fs::read_to_string(out_dir.join("gitolite.conf")).unwrap();
    assert_eq!(
        written,
        "@staff              = alice\n\nrepo    foo\n  RW+    = bob\n\n"
    );
    // The input stays untouched
    assert_eq!(
        fs::read_to_string(&config_path).unwrap(),
        "repo foo\nRW+=bob\n@staff=alice\n"
    );
}

#[test]
fn test_show_json() {
    let output = cmd()
        .arg("show")
        .arg(fixtures().join("configs/simple.conf"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["filename"], "simple.conf");
    assert_eq!(value["repos"]["testing"]["permissions"][0]["permission"], "RW+");
}

#[test]
fn test_show_yaml_by_default() {
    cmd()
        .arg("show")
        .arg(fixtures().join("configs/simple.conf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("filename: simple.conf"));
}

#[test]
fn test_keys_listing() {
    cmd()
        .arg("keys")
        .arg(fixtures().join("keys"))
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "alice - ssh-rsa alice\n\
             bob - ssh-rsa bob@zilla.com\n\
             bob desktop ssh-ed25519 bob@desktop\n",
        ));
}

#[test]
fn test_keys_missing_dir() {
    cmd()
        .args(["keys", "no-such-keydir"])
        .assert()
        .failure()
        .code(1);
}
