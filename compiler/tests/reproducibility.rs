// Reproducibility and CLI contract tests.
//
// These tests run the `logicc` binary and verify that identical inputs give
// byte-identical outputs, that build-info hashes describe what was emitted,
// and that exit codes distinguish compile errors from load errors.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sha2::{Digest, Sha256};

fn logicc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_logicc"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(logicc_binary())
        .args(args)
        .output()
        .expect("failed to run logicc")
}

fn run_ok(args: &[&str]) -> Vec<u8> {
    let output = run(args);
    assert!(
        output.status.success(),
        "logicc failed with args {:?}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output.stdout
}

fn hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("logicc-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

/// Compiling the same project twice produces byte-identical output.
#[test]
fn same_project_identical_output() {
    let path = fixture("buttons_shared_input.json");
    let p = path.to_str().unwrap();
    for emit in ["csv", "asm", "dot", "build-info"] {
        let first = run_ok(&[p, "--emit", emit]);
        let second = run_ok(&[p, "--emit", emit]);
        assert_eq!(first, second, "--emit {emit} differs across runs");
    }
}

#[test]
fn default_emit_is_csv() {
    let out = run_ok(&[fixture("analog_window_or.json").to_str().unwrap()]);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "1,16,2,13,5,16,0,19,0,88,2,255,3,1,19,0,0,0,244,1,2,12,2,2,1,3,4,13,3\n"
    );
}

#[test]
fn build_info_hashes_project_and_program() {
    let path = fixture("analog_window_direct.json");
    let p = path.to_str().unwrap();
    let info = run_ok(&[p, "--emit", "build-info"]);
    let info: serde_json::Value = serde_json::from_slice(&info).unwrap();

    let bytes_path = scratch("window.bin");
    run_ok(&[p, "--emit", "bytes", "-o", bytes_path.to_str().unwrap()]);
    let bytes = std::fs::read(&bytes_path).unwrap();

    assert_eq!(info["project_hash"], hex(&std::fs::read(&path).unwrap()));
    assert_eq!(info["program_hash"], hex(&bytes));
    assert_eq!(info["program_len"], bytes.len());
    assert_eq!(info["slot_count"], 4);
}

#[test]
fn frame_to_stdout_with_dash() {
    let out = run_ok(&[
        fixture("analog_window_or.json").to_str().unwrap(),
        "--emit",
        "frame",
        "-o",
        "-",
    ]);
    assert_eq!(out[0], 0x7E);
    assert_eq!(out[1], 29);
    assert_eq!(out.len(), 29 + 3);
}

#[test]
fn binary_emit_without_output_is_refused() {
    let output = run(&[fixture("analog_window_or.json").to_str().unwrap(), "--emit", "bytes"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_file_exits_2() {
    let output = run(&["/nonexistent/project.json"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_project_exits_2_with_code() {
    let path = scratch("broken.json");
    std::fs::write(&path, "{\"nodes\": [").unwrap();
    let output = run(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error[E0001]"));
}

#[test]
fn cycle_exits_1_with_code() {
    let path = scratch("cycle.json");
    std::fs::write(
        &path,
        r#"{"nodes": [{"id": "x", "type": "notNode"}, {"id": "y", "type": "notNode"}],
            "edges": [{"source": "x", "target": "y"}, {"source": "y", "target": "x"}]}"#,
    )
    .unwrap();
    let output = run(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[E0100]"), "stderr: {stderr}");
    assert!(stderr.contains("x, y"), "stderr: {stderr}");
}

#[test]
fn board_flag_resolves_analog_labels() {
    let path = scratch("labels.json");
    std::fs::write(
        &path,
        r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "A1"}},
                      {"id": "o", "type": "outputNode", "data": {"pin": 13}}],
            "edges": [{"source": "a", "target": "o"}]}"#,
    )
    .unwrap();
    let p = path.to_str().unwrap();

    let output = run(&[p]);
    assert_eq!(output.status.code(), Some(2), "A1 needs a board");

    let out = run_ok(&[p, "--board", "arduino_mega"]);
    assert_eq!(String::from_utf8(out).unwrap(), "1,55,2,13,3,55,0,4,13,0\n");
}

#[test]
fn order_and_slots_listings() {
    let p = fixture("analog_window_or.json");
    let order = run_ok(&[p.to_str().unwrap(), "--emit", "order"]);
    assert_eq!(
        String::from_utf8(order).unwrap(),
        "input1\nanalog2\nanalog1\nor1\noutput1\n"
    );
    let slots = run_ok(&[p.to_str().unwrap(), "--emit", "slots"]);
    assert_eq!(
        String::from_utf8(slots).unwrap(),
        "v0\tinput1\nv1\tanalog2\nv2\tanalog1\nv3\tor1\n"
    );
}
