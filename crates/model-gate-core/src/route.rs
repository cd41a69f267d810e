// crates/model-gate-core/src/route.rs
// ============================================================================
// Module: Model Gate Routes and Tenant Policies
// Description: Route and tenant policy records loaded at process start.
// Purpose: Describe upstream bindings and per-tenant permission/budget ceilings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Route`] binds a logical model name to a concrete upstream provider
//! endpoint with a selection weight and per-1000-token pricing. A
//! [`TenantPolicy`] lists the models a tenant may call and its per-request
//! cost and output-token ceilings. Both are immutable once loaded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ModelName;
use crate::identifiers::TenantId;

// ============================================================================
// SECTION: Provider Kind
// ============================================================================

/// Upstream provider flavor; selects how credentials are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible endpoint using bearer authentication.
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic endpoint using `x-api-key` authentication.
    Anthropic,
    /// Any other HTTP endpoint; bearer authentication when a credential is set.
    Generic,
}

impl ProviderKind {
    /// Returns a stable label for the provider kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Generic => "generic",
        }
    }
}

// ============================================================================
// SECTION: Route
// ============================================================================

/// Binding from a logical model name to an upstream provider endpoint.
///
/// # Invariants
/// - `cost_in` and `cost_out` are finite and non-negative.
/// - `weight` is the relative selection weight among eligible routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Canonical model name served by this route.
    pub model: ModelName,
    /// Provider flavor.
    pub provider: ProviderKind,
    /// Upstream endpoint URL.
    pub endpoint: String,
    /// Name of the environment variable holding the upstream credential.
    pub credential_ref: Option<String>,
    /// Additional model names this route accepts.
    pub models: Vec<ModelName>,
    /// Relative selection weight.
    pub weight: u32,
    /// Cost per 1000 input tokens.
    pub cost_in: f64,
    /// Cost per 1000 output tokens.
    pub cost_out: f64,
}

impl Route {
    /// Returns true when the route serves the requested model name.
    #[must_use]
    pub fn serves(&self, model: &ModelName) -> bool {
        &self.model == model || self.models.iter().any(|alias| alias == model)
    }
}

// ============================================================================
// SECTION: Tenant Policy
// ============================================================================

/// Per-tenant permission and budget policy.
///
/// # Invariants
/// - One policy per `tenant_id` within a route store.
/// - `max_request_cost` is finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantPolicy {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Model names the tenant may request.
    pub allow_models: BTreeSet<ModelName>,
    /// Maximum estimated cost of a single request.
    pub max_request_cost: f64,
    /// Maximum output tokens a single request may ask for.
    pub max_output_tokens: u32,
}

impl TenantPolicy {
    /// Returns true when the tenant may request the model.
    #[must_use]
    pub fn allows(&self, model: &ModelName) -> bool {
        self.allow_models.contains(model)
    }
}
