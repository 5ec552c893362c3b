//! Error handling integration tests for addcp CLI.
//!
//! These tests verify:
//! - Argument validation and exit codes
//! - Source validation happens before anything is written
//! - Directories are never replaced by files
//! - Error categories in the `error[code]` prefix

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, is_root};
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::{PermissionsExt, symlink};

#[test]
fn test_missing_destination_operand() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_input]"))
        .stderr(predicate::str::contains("Missing destination operand"));
}

#[test]
fn test_no_arguments_is_usage_error() {
    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.assert().code(2);
}

#[test]
fn test_nonexistent_source_writes_nothing() {
    let fx = TestFixture::new();
    let real = fx.write_src("real.txt", "real");
    let dest = fx.dst_dir_arg("out");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&real)
        .arg(fx.src.path().join("missing.txt"))
        .arg(&dest)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[source_not_found]"))
        .stderr(predicate::str::contains("missing.txt"));

    assert!(!fx.dst.path().join("out").exists());
}

#[test]
fn test_unknown_chown_user_writes_nothing() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--chown")
        .arg("no-such-user-addcp")
        .arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[ownership]"))
        .stderr(predicate::str::contains("no-such-user-addcp"));

    assert!(!fx.dst.path().join("out").exists());
}

#[test]
fn test_unknown_chown_group() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--chown")
        .arg("0:no-such-group-addcp")
        .arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown group"));
}

/// A file must never replace a directory of the same name.
#[test]
fn test_file_onto_directory_fails() {
    let fx = TestFixture::new();
    let src = fx.write_src("testdir", "file content");
    fs::create_dir_all(fx.dst.path().join("out/testdir")).unwrap();
    fs::write(fx.dst.path().join("out/testdir/inside.txt"), "inside").unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is a directory"));

    fx.assert_file_content(&fx.dst.path().join("out/testdir/inside.txt"), "inside");
}

#[test]
fn test_directory_onto_file_fails() {
    let fx = TestFixture::new();
    fx.write_src("tree/a.txt", "a");
    fs::write(fx.dst.path().join("occupied"), "keep me").unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(fx.src.path().join("tree"))
        .arg(fx.dst.path().join("occupied"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Not a directory"));

    fx.assert_file_content(&fx.dst.path().join("occupied"), "keep me");
}

#[test]
fn test_symlink_loop_destination_is_unsafe() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");
    symlink("loop", fx.dst.path().join("loop")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--root")
        .arg(fx.dst.path())
        .arg(&src)
        .arg(fx.dst_dir_arg("loop"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[unsafe_destination]"));
}

#[test]
fn test_unreadable_source_is_permission_denied() {
    if is_root() {
        eprintln!("skipping: root can read anything");
        return;
    }
    let fx = TestFixture::new();
    let src = fx.write_src("secret.txt", "secret");
    fs::set_permissions(&src, fs::Permissions::from_mode(0o000)).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[permission_denied]"));
}

#[test]
fn test_invalid_output_mode() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--output")
        .arg("yaml")
        .arg(&src)
        .arg(fx.dst.path().join("b"))
        .assert()
        .code(2);
}
