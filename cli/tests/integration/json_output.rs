//! JSON output integration tests for addcp CLI (`--output json`).

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, command_exists, write_tar_gz};
use serde_json::Value;

fn parse_stdout(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout is not a JSON document")
}

#[test]
fn test_json_success_document() {
    let fx = TestFixture::new();
    let a = fx.write_src("a.txt", "aaaa");
    let b = fx.write_src("b.txt", "bb");

    let output = cargo_bin_cmd!("addcp")
        .arg("--output")
        .arg("json")
        .arg(&a)
        .arg(&b)
        .arg(fx.dst_dir_arg("out"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc = parse_stdout(&output.stdout);
    assert_eq!(doc["schema_version"], "1.0");
    assert_eq!(doc["status"], "ok");
    assert_eq!(doc["totals"]["files_copied"], 2);
    assert_eq!(doc["totals"]["bytes_copied"], 6);
    assert_eq!(doc["archives_extracted"], 0);

    let actions = doc["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["action"], "copied");
    assert!(actions[0]["source"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(actions[0]["stats"]["bytes_copied"], 4);
}

#[test]
fn test_json_extracted_action() {
    if !command_exists("tar") {
        eprintln!("skipping: tar not available");
        return;
    }
    let fx = TestFixture::new();
    let archive = fx.src.path().join("layer.tar.gz");
    write_tar_gz(&archive, &[("hello.txt", "hi")]);

    let output = cargo_bin_cmd!("addcp")
        .arg("--output")
        .arg("json")
        .arg("--unpack")
        .arg(&archive)
        .arg(fx.dst.path().join("out"))
        .output()
        .unwrap();
    assert!(output.status.success());

    // The archive listing must not leak into the document
    let doc = parse_stdout(&output.stdout);
    assert_eq!(doc["archives_extracted"], 1);
    assert_eq!(doc["actions"][0]["action"], "extracted");
    assert_eq!(doc["actions"][0]["archive_type"], "gzip");
    fx.assert_file_content(&fx.dst.path().join("out/hello.txt"), "hi");
}

#[test]
fn test_json_failure_document() {
    let fx = TestFixture::new();

    let output = cargo_bin_cmd!("addcp")
        .arg("--output")
        .arg("json")
        .arg(fx.src.path().join("missing"))
        .arg(fx.dst_dir_arg("out"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let doc = parse_stdout(&output.stdout);
    assert_eq!(doc["status"], "failed");
    assert_eq!(doc["error_code"], "source_not_found");
    assert!(doc["error_message"].as_str().unwrap().contains("missing"));
}
