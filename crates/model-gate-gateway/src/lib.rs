// crates/model-gate-gateway/src/lib.rs
// ============================================================================
// Module: Model Gate Gateway Library
// Description: Policy-gated routing of completion requests to upstream providers.
// Purpose: Expose the gateway router and its HTTP surface.
// Dependencies: model-gate-core, model-gate-agent, axum, reqwest
// ============================================================================

//! ## Overview
//! The gateway resolves a tenant's completion request to an upstream route
//! under the tenant's model allow-list, output-token ceiling, and per-request
//! budget; records a trace; and forwards the request over HTTP.
//! Invariants:
//! - Policy is checked before route selection.
//! - Rejected requests are never traced or dispatched.
//! - A trace is appended for every request that reaches the upstream call.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod request;
pub mod router;
pub mod server;
pub mod upstream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use request::CompletionRequest;
pub use request::RequestError;
pub use router::Completion;
pub use router::DispatchPlan;
pub use router::GatewayAuditEvent;
pub use router::GatewayError;
pub use router::GatewayRouter;
pub use server::GatewayServerError;
pub use server::GatewayState;
pub use server::MAX_EGRESS_BATCH;
pub use server::MAX_EGRESS_WAIT_MS;
pub use server::MAX_TRACE_QUERY;
pub use server::TENANT_HEADER;
pub use server::TRACE_HEADER;
pub use server::app;
pub use server::bind;
pub use server::serve;
pub use upstream::CredentialSource;
pub use upstream::EnvCredentials;
pub use upstream::HttpUpstream;
pub use upstream::StaticCredentials;
pub use upstream::Upstream;
pub use upstream::UpstreamError;
