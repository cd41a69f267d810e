// crates/model-gate-cli/src/lib.rs
// ============================================================================
// Module: Model Gate CLI Library
// Description: Runtime assembly and envelope tooling behind the CLI binary.
// Purpose: Keep command logic testable outside of `main`.
// Dependencies: model-gate-config, model-gate-gateway, model-gate-agent
// ============================================================================

//! ## Overview
//! [`runtime`] turns a validated configuration into a running gateway and
//! rollout agent sharing one in-process bus. [`envelope_tools`] generates
//! signing keys and signs envelopes for operators.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod envelope_tools;
pub mod runtime;
