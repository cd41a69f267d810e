// crates/model-gate-core/src/lib.rs
// ============================================================================
// Module: Model Gate Core Library
// Description: Public API surface for the Model Gate core.
// Purpose: Expose routing tables, trace buffer, envelope verification, and audit sinks.
// Dependencies: crate::{identifiers, route, store, trace, envelope, audit}
// ============================================================================

//! ## Overview
//! Model Gate core holds the decision logic shared by the gateway router and
//! the rollout agent: the read-only route and tenant policy store, the bounded
//! trace buffer, and the Ed25519 envelope verifier. It performs no network I/O;
//! the gateway and agent crates wrap it with transports.
//! Invariants:
//! - Tenant policy is checked before route selection.
//! - The trace buffer never holds more than its configured capacity.
//! - Envelope verification is pure and deterministic.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod envelope;
pub mod identifiers;
pub mod route;
pub mod store;
pub mod trace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditLevel;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::timestamp_ms;
pub use envelope::Envelope;
pub use envelope::EnvelopeError;
pub use envelope::PlanProposal;
pub use envelope::VerificationKey;
pub use envelope::canonical_payload_bytes;
pub use envelope::sign_envelope_data;
pub use envelope::signing_key_from_base64;
pub use envelope::verify;
pub use envelope::verify_with_key;
pub use identifiers::ModelName;
pub use identifiers::PlanId;
pub use identifiers::TenantId;
pub use identifiers::TraceId;
pub use route::ProviderKind;
pub use route::Route;
pub use route::TenantPolicy;
pub use store::Resolution;
pub use store::RouteError;
pub use store::RouteSelector;
pub use store::RouteStore;
pub use store::StoreError;
pub use store::ThreadRngSelector;
pub use store::WeightedSelector;
pub use store::check_budget;
pub use store::check_output_tokens;
pub use store::estimate_cost;
pub use store::select_weighted;
pub use trace::MAX_TRACES;
pub use trace::Trace;
pub use trace::TraceBuffer;
