// crates/model-gate-core/src/audit/tests.rs
// ============================================================================
// Module: Audit Sink Unit Tests
// Description: Tests for file and memory audit sinks.
// Purpose: Ensure sinks write one JSON document per event.
// Dependencies: model-gate-core, tempfile
// ============================================================================

//! ## Overview
//! Records small serializable events through the shipped sinks.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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
    reason = "Test-only sink assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use super::AuditLevel;
use super::AuditSink;
use super::FileAuditSink;
use super::MemoryAuditSink;
use super::timestamp_ms;

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SampleEvent {
    event: &'static str,
    level: AuditLevel,
    count: u32,
}

fn sample(count: u32) -> SampleEvent {
    SampleEvent {
        event: "sample",
        level: AuditLevel::Warn,
        count,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let sink = FileAuditSink::new(&path).unwrap();
    sink.record(&sample(1));
    sink.record(&sample(2));
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event"], "sample");
    assert_eq!(first["level"], "warn");
    assert_eq!(first["count"], 1);
}

#[test]
fn memory_sink_keeps_arrival_order() {
    let sink = MemoryAuditSink::new();
    sink.record(&sample(1));
    sink.record(&sample(2));
    assert_eq!(sink.events(), vec![sample(1), sample(2)]);
}

#[test]
fn timestamp_is_after_epoch() {
    assert!(timestamp_ms() > 0);
}
