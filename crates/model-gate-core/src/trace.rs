// crates/model-gate-core/src/trace.rs
// ============================================================================
// Module: Model Gate Trace Buffer
// Description: Bounded, insertion-ordered record of dispatched requests.
// Purpose: Retain recent dispatch activity for introspection without persistence.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`TraceBuffer`] is a fixed-capacity FIFO owned by the gateway and shared by
//! cloning its handle. Appends and snapshots are serialized by one mutex, so a
//! reader never sees a partially evicted state.
//! Invariants:
//! - `len() <= capacity()` after every append.
//! - Eviction removes the oldest entries first.
//! - [`TraceBuffer::query`] returns newest first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ModelName;
use crate::identifiers::TenantId;
use crate::identifiers::TraceId;
use crate::route::ProviderKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum number of retained traces.
pub const MAX_TRACES: usize = 200;

// ============================================================================
// SECTION: Trace
// ============================================================================

/// Record of one dispatched request.
///
/// # Invariants
/// - Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Trace identifier.
    pub id: TraceId,
    /// Dispatch time (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Model name the request was routed for.
    pub model: ModelName,
    /// Tenant that made the request.
    pub tenant_id: TenantId,
    /// Provider kind of the selected route.
    pub provider: ProviderKind,
}

// ============================================================================
// SECTION: Trace Buffer
// ============================================================================

/// Shared handle to a bounded trace ring.
///
/// # Invariants
/// - Capacity is at least one.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    /// Shared ring state.
    inner: Arc<TraceRing>,
}

/// Ring state behind the shared handle.
#[derive(Debug)]
struct TraceRing {
    /// Maximum retained entries.
    capacity: usize,
    /// Entries, oldest at the front.
    entries: Mutex<VecDeque<Trace>>,
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(MAX_TRACES)
    }
}

impl TraceBuffer {
    /// Creates a buffer holding at most `capacity` entries (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(TraceRing {
                capacity,
                entries: Mutex::new(VecDeque::with_capacity(capacity)),
            }),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns the current number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no traces are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Appends a trace, evicting the oldest entries beyond capacity.
    pub fn append(&self, trace: Trace) {
        let mut entries = self.lock();
        entries.push_back(trace);
        while entries.len() > self.inner.capacity {
            entries.pop_front();
        }
    }

    /// Returns a snapshot of the `n` most recent traces, newest first.
    #[must_use]
    pub fn query(&self, n: usize) -> Vec<Trace> {
        let entries = self.lock();
        entries.iter().rev().take(n).cloned().collect()
    }

    /// Locks the ring; a poisoned lock still holds a consistent deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Trace>> {
        self.inner.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
