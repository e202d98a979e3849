//! Integration tests for the `zipper` binary.

mod common;

use std::fs;

use assert_cmd::Command;
use common::{tree, zip_names};
use predicates::prelude::*;

fn zipper_cmd() -> Command {
    Command::cargo_bin("zipper").expect("Failed to find zipper binary for testing")
}

#[test]
fn test_help_flag() {
    zipper_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pack a directory into a ZIP archive"));
}

#[test]
fn test_version_flag() {
    zipper_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_pack_with_explicit_output() {
    let src = tree(&[("a.txt", b"hi"), ("sub/b.txt", b"bye")]);
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("explicit.zip");

    zipper_cmd()
        .arg(src.path())
        .arg("-o")
        .arg(&out)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("Archive created"));

    assert_eq!(zip_names(&out), vec!["a.txt", "sub/b.txt"]);
}

#[test]
fn test_default_output_name_from_source() {
    let work = tree(&[("data/one.txt", b"1"), ("data/two.txt", b"2")]);

    zipper_cmd()
        .current_dir(work.path())
        .arg("data/")
        .arg("-q")
        .assert()
        .success();

    assert_eq!(zip_names(&work.path().join("data.zip")), vec!["one.txt", "two.txt"]);
}

#[test]
fn test_missing_source_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.zip");

    zipper_cmd()
        .arg(dir.path().join("missing"))
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source directory not found"));

    assert!(!out.exists());
}

#[test]
fn test_empty_source_warns_without_archive() {
    let src = tempfile::tempdir().unwrap();
    fs::create_dir(src.path().join("nothing-here")).unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("empty.zip");

    zipper_cmd()
        .env_remove("RUST_LOG")
        .arg(src.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::function(|err: &str| {
            err.matches("no files found").count() == 1
        }));

    assert!(!out.exists());
}

#[test]
fn test_partial_run_exits_with_two() {
    let src = tree(&[("a.txt", b"hi"), ("self.zip", b"stale")]);
    let out = src.path().join("self.zip");

    zipper_cmd()
        .arg(src.path())
        .arg("-o")
        .arg(&out)
        .arg("-q")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("self.zip"))
        .stdout(predicate::str::contains("1 error(s)"));

    assert_eq!(zip_names(&out), vec!["a.txt"]);
}

#[test]
fn test_entry_failures_are_logged_by_default() {
    let src = tree(&[("a.txt", b"hi"), ("self.zip", b"stale")]);
    let out = src.path().join("self.zip");

    zipper_cmd()
        .env_remove("RUST_LOG")
        .arg(src.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to add self.zip"));
}

#[test]
fn test_no_source_without_terminal_fails() {
    zipper_cmd()
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no source directory given"));
}
