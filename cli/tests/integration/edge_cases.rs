//! Edge case integration tests for addcp CLI.
//!
//! These tests cover:
//! - Symlinked destinations resolved inside --root
//! - Symlinks, hard links and FIFOs inside copied trees
//! - Ownership overrides
//! - Replacing existing entries

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, is_root};
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt, symlink};
use std::process::Command;

#[test]
fn test_absolute_symlink_destination_stays_in_root() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");
    // Points at `/data`, which means <root>/data
    symlink("/data", fx.dst.path().join("link")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--root")
        .arg(fx.dst.path())
        .arg(&src)
        .arg(fx.dst_dir_arg("link"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("data/a.txt"), "a");
    assert!(fs::symlink_metadata(fx.dst.path().join("link")).unwrap().file_type().is_symlink());
}

#[test]
fn test_escaping_symlink_destination_is_clamped() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");
    symlink("../../../../escaped", fx.dst.path().join("up")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--root")
        .arg(fx.dst.path())
        .arg(&src)
        .arg(fx.dst_dir_arg("up"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("escaped/a.txt"), "a");
}

#[test]
fn test_relative_root_is_taken_from_current_directory() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");
    fs::create_dir(fx.dst.path().join("rootfs")).unwrap();
    symlink("/opt", fx.dst.path().join("rootfs/app")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.current_dir(fx.dst.path())
        .arg("--root")
        .arg("rootfs")
        .arg(&src)
        .arg("rootfs/app/")
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("rootfs/opt/a.txt"), "a");
}

#[test]
fn test_existing_symlink_target_is_replaced_not_followed() {
    let fx = TestFixture::new();
    let src = fx.write_src("config", "new");
    fs::create_dir(fx.dst.path().join("etc")).unwrap();
    fs::write(fx.dst.path().join("victim"), "untouched").unwrap();
    symlink(
        fx.dst.path().join("victim"),
        fx.dst.path().join("etc/config"),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .arg(fx.dst_dir_arg("etc"))
        .assert()
        .success();

    let replaced = fx.dst.path().join("etc/config");
    assert!(!fs::symlink_metadata(&replaced).unwrap().file_type().is_symlink());
    fx.assert_file_content(&replaced, "new");
    fx.assert_file_content(&fx.dst.path().join("victim"), "untouched");
}

#[test]
fn test_top_level_symlink_source_is_followed() {
    let fx = TestFixture::new();
    fx.write_src("real.txt", "real");
    symlink("real.txt", fx.src.path().join("alias.txt")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(fx.src.path().join("alias.txt"))
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .success();

    let copied = fx.dst.path().join("out/alias.txt");
    assert!(fs::symlink_metadata(&copied).unwrap().is_file());
    fx.assert_file_content(&copied, "real");
}

#[test]
fn test_hard_links_are_kept_together() {
    let fx = TestFixture::new();
    let first = fx.write_src("tree/first", "shared");
    fs::hard_link(&first, fx.src.path().join("tree/second")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(fx.src.path().join("tree"))
        .arg(fx.dst.path().join("out"))
        .assert()
        .success();

    let a = fs::metadata(fx.dst.path().join("out/first")).unwrap();
    let b = fs::metadata(fx.dst.path().join("out/second")).unwrap();
    assert_eq!(a.ino(), b.ino());
    assert_eq!(a.nlink(), 2);
}

#[test]
fn test_fifo_is_recreated() {
    let fx = TestFixture::new();
    fs::create_dir(fx.src.path().join("tree")).unwrap();
    let fifo = fx.src.path().join("tree/pipe");
    let status = Command::new("mkfifo").arg(&fifo).status();
    if !status.is_ok_and(|s| s.success()) {
        eprintln!("skipping: mkfifo not available");
        return;
    }

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(fx.src.path().join("tree"))
        .arg(fx.dst.path().join("out"))
        .assert()
        .success();

    let meta = fs::symlink_metadata(fx.dst.path().join("out/pipe")).unwrap();
    assert!(meta.file_type().is_fifo());
}

#[test]
fn test_chown_to_self_succeeds() {
    let fx = TestFixture::new();
    let src = fx.write_src("tree/a.txt", "a");
    let meta = fs::metadata(&src).unwrap();
    let owner = format!("{}:{}", meta.uid(), meta.gid());

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--chown")
        .arg(&owner)
        .arg(fx.src.path().join("tree"))
        .arg(fx.dst_dir_arg("out/deep"))
        .assert()
        .success();

    for path in ["out", "out/deep", "out/deep/a.txt"] {
        let meta = fs::metadata(fx.dst.path().join(path)).unwrap();
        assert_eq!(meta.uid(), fs::metadata(&src).unwrap().uid(), "{path}");
        assert_eq!(meta.gid(), fs::metadata(&src).unwrap().gid(), "{path}");
    }
}

#[test]
fn test_chown_without_root_warns() {
    if is_root() {
        eprintln!("skipping: warning is only printed without root");
        return;
    }
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "a");
    let meta = fs::metadata(&src).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--chown")
        .arg(meta.uid().to_string())
        .arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .stderr(predicate::str::contains("warning:"));
}

#[test]
fn test_file_replaces_existing_file() {
    let fx = TestFixture::new();
    let src = fx.write_src("a.txt", "fresh");
    fs::write(fx.dst.path().join("a.txt"), "stale content that is longer").unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .arg(fx.dst.path().join("a.txt"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("a.txt"), "fresh");
}

#[test]
fn test_special_characters_in_names() {
    let fx = TestFixture::new();
    let src = fx.write_src("with space & ünïcode.txt", "odd");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&src)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("out/with space & ünïcode.txt"), "odd");
}

#[test]
fn test_empty_directory_source() {
    let fx = TestFixture::new();
    fs::create_dir(fx.src.path().join("empty")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(fx.src.path().join("empty"))
        .arg(fx.dst.path().join("out"))
        .assert()
        .success();

    assert!(fx.dst.path().join("out").is_dir());
    assert_eq!(fs::read_dir(fx.dst.path().join("out")).unwrap().count(), 0);
}
