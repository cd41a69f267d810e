//! File loading tests for model-gate-config.
// crates/model-gate-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Tests for reading configuration files from disk.
// Purpose: Ensure size, encoding, and parse failures surface as typed errors.
// =============================================================================

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

use std::fs;

use model_gate_config::ConfigError;
use model_gate_config::MAX_CONFIG_FILE_SIZE;
use model_gate_config::ModelGateConfig;

mod common;

#[test]
fn load_reads_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model-gate.toml");
    fs::write(&path, common::MINIMAL_TABLES).unwrap();
    let config = ModelGateConfig::load(Some(&path)).unwrap();
    assert_eq!(config.routes.len(), 1);
    assert_eq!(config.tenants[0].tenant_id, "acme");
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ModelGateConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn load_rejects_oversized_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.toml");
    let padding = "#".repeat(MAX_CONFIG_FILE_SIZE + 1);
    fs::write(&path, padding).unwrap();
    let result = ModelGateConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn load_rejects_non_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.toml");
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).unwrap();
    let result = ModelGateConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn load_validates_after_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.toml");
    fs::write(&path, "[gateway]\ntrace_capacity = 0\n").unwrap();
    let error = ModelGateConfig::load(Some(&path)).unwrap_err();
    assert_eq!(error.field_errors().len(), 1);
    assert_eq!(error.field_errors()[0].field, "gateway.trace_capacity");
}
