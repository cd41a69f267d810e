// crates/model-gate-config/src/lib.rs
// ============================================================================
// Module: Model Gate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for model-gate.toml semantics.
// Dependencies: model-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `model-gate-config` defines the configuration model for the gateway and
//! rollout agent. Configuration is parsed strictly, validated once at load
//! time, and converted into the read-only core tables. Validation reports
//! every invalid field at once.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
