// crates/model-gate-gateway/src/router.rs
// ============================================================================
// Module: Model Gate Gateway Router
// Description: Policy-checked route planning and upstream dispatch.
// Purpose: Turn a tenant's completion request into a traced upstream call.
// Dependencies: model-gate-core, serde_json
// ============================================================================

//! ## Overview
//! [`GatewayRouter::plan`] runs the admission pipeline: tenant policy and
//! route selection, output-token ceiling, cost estimate, and budget check.
//! [`GatewayRouter::dispatch`] then records a trace and forwards the request
//! upstream.
//! Invariants:
//! - Rejected requests never reach the trace buffer or the upstream.
//! - The trace is appended before the upstream call is awaited, so failed
//!   upstream calls still leave a dispatch record.
//! - The upstream payload always carries the budgeted `max_tokens`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use model_gate_core::AuditLevel;
use model_gate_core::AuditSink;
use model_gate_core::ModelName;
use model_gate_core::NoopAuditSink;
use model_gate_core::ProviderKind;
use model_gate_core::Resolution;
use model_gate_core::Route;
use model_gate_core::RouteError;
use model_gate_core::RouteStore;
use model_gate_core::TenantId;
use model_gate_core::Trace;
use model_gate_core::TraceBuffer;
use model_gate_core::TraceId;
use model_gate_core::check_budget;
use model_gate_core::check_output_tokens;
use model_gate_core::estimate_cost;
use model_gate_core::timestamp_ms;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::request::CompletionRequest;
use crate::request::RequestError;
use crate::upstream::Upstream;
use crate::upstream::UpstreamError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway request failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Request body failed validation.
    #[error(transparent)]
    BadRequest(#[from] RequestError),
    /// Admission rejected the request.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// Upstream call failed after dispatch.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Gateway audit event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: AuditLevel,
    /// Requesting tenant.
    pub tenant_id: TenantId,
    /// Requested model.
    pub model: ModelName,
    /// Selected provider when a route was chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    /// Trace identifier when dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
    /// Estimated request cost when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl GatewayAuditEvent {
    /// Creates an event for a tenant request.
    fn new(
        event: &'static str,
        level: AuditLevel,
        tenant_id: &TenantId,
        model: &ModelName,
    ) -> Self {
        Self {
            event,
            timestamp_ms: timestamp_ms(),
            level,
            tenant_id: tenant_id.clone(),
            model: model.clone(),
            provider: None,
            trace_id: None,
            estimated_cost: None,
            detail: None,
        }
    }

    /// Attaches plan details.
    fn with_plan(mut self, plan: &DispatchPlan) -> Self {
        self.provider = Some(plan.route.provider);
        self.estimated_cost = Some(plan.estimated_cost);
        self
    }
}

// ============================================================================
// SECTION: Plans and Results
// ============================================================================

/// Admitted request ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    /// Selected route.
    pub route: Route,
    /// Estimated input tokens.
    pub tokens_in: u32,
    /// Budgeted output tokens.
    pub tokens_out: u32,
    /// Estimated request cost.
    pub estimated_cost: f64,
}

/// Successful upstream completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Trace recorded for the dispatch.
    pub trace_id: TraceId,
    /// Plan the request was dispatched under.
    pub plan: DispatchPlan,
    /// Upstream JSON response.
    pub response: Value,
}

// ============================================================================
// SECTION: Gateway Router
// ============================================================================

/// Routes tenant completion requests to upstream providers.
#[derive(Clone)]
pub struct GatewayRouter {
    /// Route and policy tables.
    store: RouteStore,
    /// Recent dispatch records.
    traces: TraceBuffer,
    /// Upstream backend.
    upstream: Arc<dyn Upstream>,
    /// Audit sink.
    audit: Arc<dyn AuditSink<GatewayAuditEvent>>,
    /// Output tokens budgeted when a request omits `max_tokens`.
    default_output_tokens: Option<u32>,
}

impl GatewayRouter {
    /// Creates a router with no audit sink and no default output budget.
    #[must_use]
    pub fn new(store: RouteStore, traces: TraceBuffer, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            store,
            traces,
            upstream,
            audit: Arc::new(NoopAuditSink),
            default_output_tokens: None,
        }
    }

    /// Sets the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink<GatewayAuditEvent>>) -> Self {
        self.audit = audit;
        self
    }

    /// Sets the output budget used when a request omits `max_tokens`.
    #[must_use]
    pub const fn with_default_output_tokens(mut self, tokens: Option<u32>) -> Self {
        self.default_output_tokens = tokens;
        self
    }

    /// Returns the trace buffer handle.
    #[must_use]
    pub const fn traces(&self) -> &TraceBuffer {
        &self.traces
    }

    /// Returns the route store.
    #[must_use]
    pub const fn store(&self) -> &RouteStore {
        &self.store
    }

    /// Admits a request: policy, route, output ceiling, cost, and budget.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when any admission check fails.
    pub fn plan(
        &self,
        tenant_id: &TenantId,
        request: &CompletionRequest,
    ) -> Result<DispatchPlan, RouteError> {
        let Resolution {
            route,
            policy,
        } = self.store.resolve(tenant_id, request.model())?;
        let tokens_out = match request.max_tokens() {
            Some(requested) => {
                check_output_tokens(policy, requested)?;
                requested
            }
            None => self
                .default_output_tokens
                .map_or(policy.max_output_tokens, |tokens| tokens.min(policy.max_output_tokens)),
        };
        let tokens_in = request.estimate_input_tokens();
        let estimated_cost = estimate_cost(route, tokens_in, tokens_out);
        check_budget(policy, estimated_cost)?;
        Ok(DispatchPlan {
            route: route.clone(),
            tokens_in,
            tokens_out,
            estimated_cost,
        })
    }

    /// Admits, traces, and forwards a request upstream.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Route`] when admission fails and
    /// [`GatewayError::Upstream`] when the provider call fails.
    pub async fn dispatch(
        &self,
        tenant_id: &TenantId,
        request: &CompletionRequest,
    ) -> Result<Completion, GatewayError> {
        let plan = match self.plan(tenant_id, request) {
            Ok(plan) => plan,
            Err(err) => {
                let mut event = GatewayAuditEvent::new(
                    "request_rejected",
                    AuditLevel::Warn,
                    tenant_id,
                    request.model(),
                );
                event.detail = Some(err.to_string());
                self.audit.record(&event);
                return Err(err.into());
            }
        };
        let trace_id = TraceId::generate();
        self.traces.append(Trace {
            id: trace_id.clone(),
            timestamp_ms: timestamp_ms(),
            model: request.model().clone(),
            tenant_id: tenant_id.clone(),
            provider: plan.route.provider,
        });
        let mut body = request.upstream_body(&plan.route);
        if let Value::Object(fields) = &mut body {
            fields.insert("max_tokens".to_string(), Value::from(plan.tokens_out));
        }
        let result = self.upstream.complete(&plan.route, &body).await;
        let mut event = match &result {
            Ok(_) => GatewayAuditEvent::new(
                "request_dispatched",
                AuditLevel::Info,
                tenant_id,
                request.model(),
            ),
            Err(err) => {
                let mut event = GatewayAuditEvent::new(
                    "upstream_failed",
                    AuditLevel::Error,
                    tenant_id,
                    request.model(),
                );
                event.detail = Some(err.to_string());
                event
            }
        }
        .with_plan(&plan);
        event.trace_id = Some(trace_id.clone());
        self.audit.record(&event);
        let response = result?;
        Ok(Completion {
            trace_id,
            plan,
            response,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
