// crates/model-gate-agent/src/decision.rs
// ============================================================================
// Module: Model Gate Decisions
// Description: Allow/block decisions for verified rollout plans.
// Purpose: Turn a policy verdict (or its absence) into a publishable decision.
// Dependencies: model-gate-core, serde
// ============================================================================

//! ## Overview
//! [`decide`] maps the policy stage onto a [`Decision`]:
//! - no policy client configured: allow, reason `"allow"`;
//! - verdict obtained: follow `allow`, using the engine reason when given;
//! - policy call failed: block, reason is the error text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use model_gate_core::PlanId;
use model_gate_core::PlanProposal;
use serde::Deserialize;
use serde::Serialize;

use crate::policy::PolicyClient;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reason attached to allow decisions without an engine-supplied reason.
pub const ALLOW_REASON: &str = "allow";
/// Reason attached to engine denials without an engine-supplied reason.
pub const DENY_REASON: &str = "denied by policy";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a plan authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Plan may take effect.
    Allow,
    /// Plan must not take effect.
    Block,
}

/// Authorization decision for one plan.
///
/// # Invariants
/// - `reason` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Allow or block.
    pub outcome: DecisionOutcome,
    /// Plan the decision applies to.
    pub plan_id: PlanId,
    /// Human-readable reason.
    pub reason: String,
}

/// Type tags placed on published decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionMarkers {
    /// Tag for allow decisions.
    pub allow: String,
    /// Tag for block decisions.
    pub block: String,
}

/// Wire form of a published decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMessage {
    /// Allow or block marker.
    #[serde(rename = "type")]
    pub kind: String,
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Human-readable reason.
    pub reason: String,
}

impl Decision {
    /// Renders the decision with the configured markers.
    #[must_use]
    pub fn to_message(&self, markers: &DecisionMarkers) -> DecisionMessage {
        let kind = match self.outcome {
            DecisionOutcome::Allow => markers.allow.clone(),
            DecisionOutcome::Block => markers.block.clone(),
        };
        DecisionMessage {
            kind,
            plan_id: self.plan_id.clone(),
            reason: self.reason.clone(),
        }
    }
}

// ============================================================================
// SECTION: Decision Logic
// ============================================================================

/// Decides a verified plan using the optional policy client.
pub async fn decide(plan: &PlanProposal, policy: Option<&dyn PolicyClient>) -> Decision {
    let Some(policy) = policy else {
        return Decision {
            outcome: DecisionOutcome::Allow,
            plan_id: plan.plan_id.clone(),
            reason: ALLOW_REASON.to_string(),
        };
    };
    let (outcome, reason) = match policy.evaluate(plan).await {
        Ok(verdict) if verdict.allow => {
            (DecisionOutcome::Allow, non_empty_or(verdict.reason, ALLOW_REASON))
        }
        Ok(verdict) => (DecisionOutcome::Block, non_empty_or(verdict.reason, DENY_REASON)),
        Err(err) => (DecisionOutcome::Block, err.to_string()),
    };
    Decision {
        outcome,
        plan_id: plan.plan_id.clone(),
        reason,
    }
}

/// Returns `reason` when non-blank, else `fallback`.
fn non_empty_or(reason: Option<String>, fallback: &str) -> String {
    reason.filter(|reason| !reason.trim().is_empty()).unwrap_or_else(|| fallback.to_string())
}
