// crates/model-gate-agent/src/lib.rs
// ============================================================================
// Module: Model Gate Agent Library
// Description: Rollout agent consuming plan envelopes from a message bus.
// Purpose: Authorize rollout plans by provenance and external policy.
// Dependencies: model-gate-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! The rollout agent subscribes to an inbound bus subject, keeps only plan
//! envelopes, verifies their Ed25519 signature when a key is configured,
//! asks an external policy engine for a verdict, and publishes one allow or
//! block decision per processed plan.
//! Invariants:
//! - Messages are processed one at a time, in delivery order.
//! - A single bad message never stops the loop.
//! - Policy failures block (fail-closed); no policy endpoint allows.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod agent;
pub mod bus;
pub mod decision;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use agent::AgentAuditEvent;
pub use agent::AgentError;
pub use agent::AgentSettings;
pub use agent::MessageOutcome;
pub use agent::RolloutAgent;
pub use agent::RunSummary;
pub use bus::BusError;
pub use bus::BusMessage;
pub use bus::DEFAULT_CHANNEL_CAPACITY;
pub use bus::InMemoryBus;
pub use bus::MessageBus;
pub use bus::Outbox;
pub use bus::Subscription;
pub use decision::Decision;
pub use decision::DecisionMarkers;
pub use decision::DecisionMessage;
pub use decision::DecisionOutcome;
pub use decision::decide;
pub use policy::HttpPolicyClient;
pub use policy::PolicyClient;
pub use policy::PolicyClientError;
pub use policy::PolicyVerdict;
pub use policy::parse_policy_response;
