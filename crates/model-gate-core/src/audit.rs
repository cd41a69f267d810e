// crates/model-gate-core/src/audit.rs
// ============================================================================
// Module: Model Gate Audit Logging
// Description: Audit sink trait and JSON-lines sinks shared by gateway and agent.
// Purpose: Emit structured audit events without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Components describe what happened with typed, serializable event structs
//! and hand them to an [`AuditSink`]. Sinks write one JSON document per line
//! to stderr or to an append-only file, discard events, or keep them in memory
//! for assertions. Sink failures never propagate to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity attached to audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Routine activity.
    Info,
    /// Dropped input or degraded behavior.
    Warn,
    /// Failure requiring operator attention.
    Error,
}

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn timestamp_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_millis()).unwrap_or(0)
}

// ============================================================================
// SECTION: Audit Sinks
// ============================================================================

/// Audit sink for structured events of type `E`.
pub trait AuditSink<E>: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &E);
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl<E: Serialize> AuditSink<E> for StderrAuditSink {
    fn record(&self, event: &E) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<E: Serialize> AuditSink<E> for FileAuditSink {
    fn record(&self, event: &E) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl<E> AuditSink<E> for NoopAuditSink {
    fn record(&self, _event: &E) {}
}

/// Audit sink that retains events in memory.
#[derive(Debug)]
pub struct MemoryAuditSink<E> {
    /// Recorded events in arrival order.
    events: Mutex<Vec<E>>,
}

impl<E> Default for MemoryAuditSink<E> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> MemoryAuditSink<E> {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<E: Clone + Send> AuditSink<E> for MemoryAuditSink<E> {
    fn record(&self, event: &E) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
