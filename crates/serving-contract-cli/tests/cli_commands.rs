// crates/serving-contract-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Runs the serving-contract binary against temp fixtures.
// Purpose: Ensure commands print results on stdout and fail with exit codes.
// Dependencies: serving-contract-cli binary, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Spawns the `serving-contract` binary:
//! - `config example` output validates with `config validate`
//! - `contract check` prints a JSON client summary
//! - Mismatched documents fail with a non-zero exit and a stderr message

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn serving_contract_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_serving-contract"))
}

fn run(args: &[&str]) -> Output {
    Command::new(serving_contract_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SERVING_CONTRACT_CONFIG")
        .output()
        .expect("run serving-contract")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn write_example_config(dir: &TempDir) -> PathBuf {
    let output = run(&["config", "example"]);
    assert!(output.status.success());
    let path = dir.path().join("serving-contract.toml");
    fs::write(&path, &output.stdout).unwrap();
    path
}

fn write_documents(dir: &TempDir, input_dims: &str) -> (PathBuf, PathBuf) {
    let metadata = dir.path().join("metadata.json");
    fs::write(
        &metadata,
        format!(
            r#"{{"name": "resnet_inference", "versions": ["1"],
                "inputs": [{{"name": "input", "datatype": "FP32", "shape": [-1, {input_dims}]}}],
                "outputs": [{{"name": "embedding", "datatype": "FP32", "shape": [-1, 1000]}}]}}"#
        ),
    )
    .unwrap();
    let model_config = dir.path().join("config.json");
    fs::write(
        &model_config,
        format!(
            r#"{{"name": "resnet_inference", "max_batch_size": 8,
                "input": [{{"name": "input", "data_type": "TYPE_FP32", "format": "FORMAT_NCHW",
                            "dims": [{input_dims}]}}],
                "output": [{{"name": "embedding", "data_type": "TYPE_FP32", "dims": [1000]}}]}}"#
        ),
    )
    .unwrap();
    (metadata, model_config)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn example_config_validates() {
    let dir = TempDir::new().unwrap();
    let config = write_example_config(&dir);
    let output = run(&["config", "validate", "--config", path_arg(&config)]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("config ok: model resnet_inference:1"));
}

#[test]
fn contract_check_prints_client_summary() {
    let dir = TempDir::new().unwrap();
    let config = write_example_config(&dir);
    let (metadata, model_config) = write_documents(&dir, "3, 224, 224");
    let output = run(&[
        "contract",
        "check",
        "--config",
        path_arg(&config),
        "--metadata",
        path_arg(&metadata),
        "--model-config",
        path_arg(&model_config),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["max_batch_size"], 8);
    assert_eq!(summary["inputs"][0]["name"], "input");
    assert_eq!(summary["inputs"][0]["format"], "NCHW");
    assert_eq!(summary["inputs"][0]["shape"], serde_json::json!([-1, 3, 224, 224]));
    assert_eq!(summary["cast_policy"], "checked");
}

#[test]
fn contract_check_fails_on_shape_mismatch() {
    let dir = TempDir::new().unwrap();
    let config = write_example_config(&dir);
    let (metadata, model_config) = write_documents(&dir, "3, 224, 225");
    let output = run(&[
        "contract",
        "check",
        "--config",
        path_arg(&config),
        "--metadata",
        path_arg(&metadata),
        "--model-config",
        path_arg(&model_config),
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("contract check failed"));
    assert!(stderr.contains("'input'"));
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let output = run(&["config", "validate", "--config", path_arg(&missing)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to load config"));
}
