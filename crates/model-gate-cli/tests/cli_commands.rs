// crates/model-gate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the `model-gate` binary.
// Purpose: Ensure config validation and envelope tooling behave end to end.
// Dependencies: model-gate-cli binary, model-gate-core, tempfile
// ============================================================================

//! ## Overview
//! Runs the CLI binary for config validation, key generation, and signing.
//!
//! Security posture: configuration inputs are untrusted; validation must fail closed.

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
use std::path::PathBuf;
use std::process::Command;

use model_gate_config::config_toml_example;
use model_gate_core::Envelope;
use model_gate_core::VerificationKey;
use model_gate_core::verify_with_key;
use serde_json::Value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn model_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_model-gate"))
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(model_gate_bin())
        .args(args)
        .env_remove("MODEL_GATE_CONFIG")
        .output()
        .expect("run model-gate")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies the shipped example configuration validates.
#[test]
fn config_validate_accepts_example_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model-gate.toml");
    fs::write(&path, config_toml_example()).unwrap();

    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "config ok");
}

/// Verifies every invalid field is reported in one run.
#[test]
fn config_validate_reports_all_invalid_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model-gate.toml");
    let config = r#"
[server]
bind = "not-an-address"

[[routes]]
model = ""
provider = "openai"
endpoint = "ftp://example.com"
cost_in = -1.0
cost_out = 0.0
"#;
    fs::write(&path, config).unwrap();

    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("server.bind"), "{stderr}");
    assert!(stderr.contains("routes[0].model"), "{stderr}");
    assert!(stderr.contains("routes[0].endpoint"), "{stderr}");
    assert!(stderr.contains("routes[0].cost_in"), "{stderr}");
}

/// Verifies unknown fields fail parsing.
#[test]
fn config_validate_rejects_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model-gate.toml");
    fs::write(&path, "[server]\nport = 8080\n").unwrap();

    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("parse error"));
}

/// Verifies a missing config file fails closed.
#[test]
fn config_validate_fails_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config io error"));
}

/// Verifies keygen output signs envelopes that verify against its public key.
#[test]
fn keygen_and_sign_produce_verifiable_envelopes() {
    let keygen = run(&["envelope", "keygen"]);
    assert!(keygen.status.success());
    let keys: Value = serde_json::from_slice(&keygen.stdout).unwrap();
    let signing_key = keys["signing_key"].as_str().unwrap();
    let public_key = keys["public_key"].as_str().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("signing.key");
    let data_path = dir.path().join("plan.json");
    fs::write(&key_path, format!("{signing_key}\n")).unwrap();
    fs::write(&data_path, r#"{"plan": {"id": "P1", "percent": 5}}"#).unwrap();

    let sign = run(&[
        "envelope",
        "sign",
        "--signing-key",
        key_path.to_str().unwrap(),
        "--type",
        "plan.proposed",
        "--data",
        data_path.to_str().unwrap(),
        "--key-id",
        "release",
    ]);
    assert!(sign.status.success(), "{}", String::from_utf8_lossy(&sign.stderr));
    let envelope = Envelope::from_slice(&sign.stdout).unwrap();
    assert_eq!(envelope.kind, "plan.proposed");
    assert_eq!(envelope.key_id.as_deref(), Some("release"));
    assert_eq!(envelope.plan().unwrap().plan_id.as_str(), "P1");

    let key = VerificationKey::from_base64(public_key, Some("release".to_string())).unwrap();
    verify_with_key(&envelope, &key).unwrap();
}

/// Verifies signing fails for non-JSON data.
#[test]
fn sign_rejects_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("signing.key");
    let data_path = dir.path().join("plan.json");
    fs::write(&key_path, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=").unwrap();
    fs::write(&data_path, "not json").unwrap();

    let output = run(&[
        "envelope",
        "sign",
        "--signing-key",
        key_path.to_str().unwrap(),
        "--type",
        "plan.proposed",
        "--data",
        data_path.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid envelope data"));
}
