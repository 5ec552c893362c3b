//! Archive handling integration tests for addcp CLI (`--unpack`).
//!
//! Archives are recognized by content and extracted with the system `tar`.
//! Tests skip themselves when the needed tools are missing.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{
    TestFixture, command_exists, tar_bytes, write_tar_bz2, write_tar_gz, write_tar_xz,
};
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::Path;

const ENTRIES: &[(&str, &str)] = &[("etc/motd", "welcome"), ("bin/tool", "#!/bin/sh\n")];

fn write_archive(path: &Path, kind: &str) {
    match kind {
        "tar" => fs::write(path, tar_bytes(ENTRIES)).unwrap(),
        "gzip" => write_tar_gz(path, ENTRIES),
        "bzip2" => write_tar_bz2(path, ENTRIES),
        "xz" => write_tar_xz(path, ENTRIES),
        other => panic!("unknown archive kind {other}"),
    }
}

#[rstest]
#[case::plain("tar", None)]
#[case::gzip("gzip", Some("gzip"))]
#[case::bzip2("bzip2", Some("bzip2"))]
#[case::xz("xz", Some("xz"))]
fn test_extracts_each_compression(#[case] kind: &str, #[case] tool: Option<&str>) {
    if !command_exists("tar") || tool.is_some_and(|t| !command_exists(t)) {
        eprintln!("skipping: tar/{kind} not available");
        return;
    }
    let fx = TestFixture::new();
    // The name says nothing; detection reads the bytes
    let archive = fx.src.path().join("rootfs.bin");
    write_archive(&archive, kind);

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--unpack")
        .arg("-q")
        .arg(&archive)
        .arg(fx.dst.path().join("rootfs"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("rootfs/etc/motd"), "welcome");
    fx.assert_file_content(&fx.dst.path().join("rootfs/bin/tool"), "#!/bin/sh\n");
}

#[test]
fn test_without_unpack_archive_is_copied() {
    let fx = TestFixture::new();
    let archive = fx.src.path().join("rootfs.tar.gz");
    write_tar_gz(&archive, ENTRIES);

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg(&archive).arg(fx.dst_dir_arg("out")).assert().success();

    assert_eq!(
        fs::read(fx.dst.path().join("out/rootfs.tar.gz")).unwrap(),
        fs::read(&archive).unwrap()
    );
    assert!(!fx.dst.path().join("out/etc").exists());
}

#[test]
fn test_misnamed_text_file_is_copied() {
    let fx = TestFixture::new();
    let fake = fx.write_src("notes.tar.gz", "just some text");

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--unpack")
        .arg(&fake)
        .arg(fx.dst_dir_arg("out"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dst.path().join("out/notes.tar.gz"), "just some text");
}

#[test]
fn test_mixed_sources_into_existing_directory() {
    if !command_exists("tar") {
        eprintln!("skipping: tar not available");
        return;
    }
    let fx = TestFixture::new();
    let archive = fx.src.path().join("layer.tgz");
    write_tar_gz(&archive, ENTRIES);
    let plain = fx.write_src("readme.txt", "read me");
    fs::create_dir(fx.dst.path().join("image")).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--unpack")
        .arg("-q")
        .arg(&archive)
        .arg(&plain)
        .arg(fx.dst.path().join("image"))
        .assert()
        .success()
        .stdout(predicate::str::contains("extracted 1 archive"));

    fx.assert_file_content(&fx.dst.path().join("image/etc/motd"), "welcome");
    fx.assert_file_content(&fx.dst.path().join("image/readme.txt"), "read me");
    assert!(!fx.dst.path().join("image/layer.tgz").exists());
}

#[test]
fn test_verbose_extract_lists_entries() {
    if !command_exists("tar") {
        eprintln!("skipping: tar not available");
        return;
    }
    let fx = TestFixture::new();
    let archive = fx.src.path().join("layer.tar");
    fs::write(&archive, tar_bytes(ENTRIES)).unwrap();

    // GNU tar lists to stdout, bsdtar to stderr
    let output = cargo_bin_cmd!("addcp")
        .arg("--unpack")
        .arg(&archive)
        .arg(fx.dst.path().join("out"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(listed.contains("etc/motd"), "listing missing: {listed}");
}

#[test]
fn test_archive_tool_failure() {
    if !command_exists("false") {
        eprintln!("skipping: false not available");
        return;
    }
    let fx = TestFixture::new();
    let archive = fx.src.path().join("layer.tar");
    fs::write(&archive, tar_bytes(ENTRIES)).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--unpack")
        .arg("--tar")
        .arg("false")
        .arg(&archive)
        .arg(fx.dst.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[extract_failed]"));
}

#[test]
fn test_missing_archive_tool() {
    let fx = TestFixture::new();
    let archive = fx.src.path().join("layer.tar");
    fs::write(&archive, tar_bytes(ENTRIES)).unwrap();

    let mut cmd = cargo_bin_cmd!("addcp");
    cmd.arg("--unpack")
        .arg("--tar")
        .arg("/nonexistent/addcopy-tar")
        .arg(&archive)
        .arg(fx.dst.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[extract_failed]"));
}
