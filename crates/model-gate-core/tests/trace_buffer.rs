// crates/model-gate-core/tests/trace_buffer.rs
// ============================================================================
// Module: Trace Buffer Tests
// Description: Tests for bounded FIFO eviction and newest-first snapshots.
// Purpose: Ensure the trace buffer never exceeds capacity under any workload.
// ============================================================================

//! ## Overview
//! Validates eviction order, snapshot ordering, and concurrent appends.

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

use std::thread;

use model_gate_core::MAX_TRACES;
use model_gate_core::ModelName;
use model_gate_core::ProviderKind;
use model_gate_core::TenantId;
use model_gate_core::Trace;
use model_gate_core::TraceBuffer;
use model_gate_core::TraceId;
use proptest::prelude::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn trace(sequence: usize) -> Trace {
    Trace {
        id: TraceId::new(format!("trace-{sequence}")),
        timestamp_ms: sequence as u128,
        model: ModelName::new("gpt-4o"),
        tenant_id: TenantId::new("acme"),
        provider: ProviderKind::OpenAi,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn appending_past_capacity_keeps_newest_entries() {
    let buffer = TraceBuffer::default();
    assert_eq!(buffer.capacity(), MAX_TRACES);
    for sequence in 1 ..= 250 {
        buffer.append(trace(sequence));
    }
    assert_eq!(buffer.len(), 200);
    let snapshot = buffer.query(200);
    assert_eq!(snapshot.len(), 200);
    assert_eq!(snapshot[0].id.as_str(), "trace-250");
    assert_eq!(snapshot[199].id.as_str(), "trace-51");
}

#[test]
fn query_returns_at_most_available_entries() {
    let buffer = TraceBuffer::new(10);
    buffer.append(trace(1));
    buffer.append(trace(2));
    let snapshot = buffer.query(50);
    let ids: Vec<&str> = snapshot.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids, vec!["trace-2", "trace-1"]);
    assert!(buffer.query(0).is_empty());
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let buffer = TraceBuffer::new(0);
    buffer.append(trace(1));
    buffer.append(trace(2));
    assert_eq!(buffer.capacity(), 1);
    assert_eq!(buffer.query(5)[0].id.as_str(), "trace-2");
}

#[test]
fn concurrent_appends_respect_capacity() {
    let buffer = TraceBuffer::new(64);
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let buffer = buffer.clone();
            thread::spawn(move || {
                for step in 0 .. 100 {
                    buffer.append(trace(worker * 1000 + step));
                    assert!(buffer.len() <= 64);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(buffer.len(), 64);
}

proptest! {
    #[test]
    fn buffer_is_bounded_and_fifo(capacity in 1_usize .. 32, appends in 0_usize .. 128) {
        let buffer = TraceBuffer::new(capacity);
        for sequence in 0 .. appends {
            buffer.append(trace(sequence));
        }
        prop_assert_eq!(buffer.len(), appends.min(capacity));
        let snapshot = buffer.query(capacity);
        for (offset, entry) in snapshot.iter().enumerate() {
            let expected = format!("trace-{}", appends - 1 - offset);
            prop_assert_eq!(entry.id.as_str(), expected.as_str());
        }
    }
}
