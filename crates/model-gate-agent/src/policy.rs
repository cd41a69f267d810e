// crates/model-gate-agent/src/policy.rs
// ============================================================================
// Module: Model Gate Policy Client
// Description: External policy-decision queries for rollout plans.
// Purpose: Ask a policy engine whether a verified plan may proceed.
// Dependencies: async-trait, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpPolicyClient`] posts `{"input": <plan payload>}` to a policy
//! endpoint and reads the canonical verdict at `result.allow`, with an
//! optional string `result.reason`. Any other response shape is malformed.
//! Security posture: the policy engine is a trust boundary; every failure
//! is surfaced as an error so callers can fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use model_gate_core::PlanProposal;
use reqwest::Client;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Policy engine verdict for a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVerdict {
    /// Whether the plan may proceed.
    pub allow: bool,
    /// Optional engine-supplied reason.
    pub reason: Option<String>,
}

/// Policy client failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyClientError {
    /// HTTP client could not be constructed.
    #[error("policy client setup failed: {0}")]
    Setup(String),
    /// Request exceeded its timeout.
    #[error("policy request timed out after {0} ms")]
    Timeout(u128),
    /// Transport-level failure.
    #[error("policy request failed: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("policy endpoint returned status {0}")]
    Status(u16),
    /// Response does not match the verdict contract.
    #[error("malformed policy response: {0}")]
    Malformed(String),
}

/// Policy-decision backend.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Evaluates a plan.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyClientError`] when no verdict could be obtained.
    async fn evaluate(&self, plan: &PlanProposal) -> Result<PolicyVerdict, PolicyClientError>;
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Policy client posting plans to an HTTP policy endpoint.
#[derive(Debug, Clone)]
pub struct HttpPolicyClient {
    /// Policy endpoint URL.
    url: String,
    /// Request timeout.
    timeout: Duration,
    /// HTTP client configured with the timeout.
    client: Client,
}

impl HttpPolicyClient {
    /// Builds a client for `url` bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyClientError::Setup`] when the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PolicyClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PolicyClientError::Setup(err.to_string()))?;
        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// Returns the policy endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Maps a send failure to a policy client error.
    fn map_error(&self, err: &reqwest::Error) -> PolicyClientError {
        if err.is_timeout() {
            PolicyClientError::Timeout(self.timeout.as_millis())
        } else {
            PolicyClientError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn evaluate(&self, plan: &PlanProposal) -> Result<PolicyVerdict, PolicyClientError> {
        let body = json!({ "input": plan.payload });
        let response =
            self.client.post(&self.url).json(&body).send().await.map_err(|err| self.map_error(&err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolicyClientError::Status(status.as_u16()));
        }
        let document: Value = response.json().await.map_err(|err| {
            if err.is_timeout() {
                PolicyClientError::Timeout(self.timeout.as_millis())
            } else {
                PolicyClientError::Malformed(err.to_string())
            }
        })?;
        parse_policy_response(&document)
    }
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Parses the canonical `{"result": {"allow": bool, "reason"?: string}}` shape.
///
/// # Errors
///
/// Returns [`PolicyClientError::Malformed`] for any other shape, including a
/// bare boolean `result`.
pub fn parse_policy_response(document: &Value) -> Result<PolicyVerdict, PolicyClientError> {
    let result = document
        .get("result")
        .ok_or_else(|| PolicyClientError::Malformed("missing result".to_string()))?;
    let object = result
        .as_object()
        .ok_or_else(|| PolicyClientError::Malformed("result must be an object".to_string()))?;
    let allow = object
        .get("allow")
        .and_then(Value::as_bool)
        .ok_or_else(|| PolicyClientError::Malformed("result.allow must be a boolean".to_string()))?;
    let reason = match object.get("reason") {
        None | Some(Value::Null) => None,
        Some(Value::String(reason)) => Some(reason.clone()),
        Some(_) => {
            return Err(PolicyClientError::Malformed(
                "result.reason must be a string".to_string(),
            ));
        }
    };
    Ok(PolicyVerdict {
        allow,
        reason,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
