//! Common test utilities for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test fixture that provides source and destination directories.
pub struct TestFixture {
    pub src: TempDir,
    pub dst: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with fresh source and destination directories.
    pub fn new() -> Self {
        Self {
            src: TempDir::new().expect("Failed to create temp source dir"),
            dst: TempDir::new().expect("Failed to create temp dest dir"),
        }
    }

    /// Write `content` to `name` under the source directory.
    pub fn write_src(&self, name: &str, content: &str) -> PathBuf {
        let path = self.src.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Destination path as a string with a trailing slash.
    pub fn dst_dir_arg(&self, name: &str) -> String {
        format!("{}/", self.dst.path().join(name).display())
    }

    /// Check if a file exists and has the expected content.
    pub fn assert_file_content(&self, path: &Path, expected: &str) {
        assert!(path.exists(), "File does not exist: {:?}", path);
        let actual = fs::read_to_string(path).expect("Failed to read file");
        assert_eq!(actual, expected, "File content mismatch");
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an uncompressed tar stream holding `entries` (name, content).
pub fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_600_000_000);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .expect("Failed to append tar entry");
    }
    builder.into_inner().expect("Failed to finish tar stream")
}

/// Write a gzip compressed tarball of `entries` to `path`.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&tar_bytes(entries))
        .expect("Failed to compress");
    fs::write(path, encoder.finish().expect("Failed to finish gzip")).expect("Failed to write");
}

/// Write a bzip2 compressed tarball of `entries` to `path`.
pub fn write_tar_bz2(path: &Path, entries: &[(&str, &str)]) {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(&tar_bytes(entries))
        .expect("Failed to compress");
    fs::write(path, encoder.finish().expect("Failed to finish bzip2")).expect("Failed to write");
}

/// Write an xz compressed tarball of `entries` to `path`.
pub fn write_tar_xz(path: &Path, entries: &[(&str, &str)]) {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder
        .write_all(&tar_bytes(entries))
        .expect("Failed to compress");
    fs::write(path, encoder.finish().expect("Failed to finish xz")).expect("Failed to write");
}

/// Check if a command is available on the system.
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new(cmd)
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

/// Whether the test process runs as root.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions
    unsafe { libc::geteuid() == 0 }
}
