// crates/model-gate-gateway/src/router/tests.rs
// ============================================================================
// Module: Gateway Router Unit Tests
// Description: Tests for admission, tracing, and dispatch ordering.
// Purpose: Ensure rejected requests leave no trace and admitted ones do.
// Dependencies: model-gate-gateway, tokio
// ============================================================================

//! ## Overview
//! Uses a recording fake upstream to observe dispatched payloads.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only router assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use model_gate_core::AuditLevel;
use model_gate_core::MemoryAuditSink;
use model_gate_core::ModelName;
use model_gate_core::ProviderKind;
use model_gate_core::Route;
use model_gate_core::RouteError;
use model_gate_core::RouteStore;
use model_gate_core::TenantId;
use model_gate_core::TenantPolicy;
use model_gate_core::TraceBuffer;
use serde_json::Value;
use serde_json::json;

use super::GatewayAuditEvent;
use super::GatewayError;
use super::GatewayRouter;
use crate::request::CompletionRequest;
use crate::upstream::Upstream;
use crate::upstream::UpstreamError;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Upstream that records payloads and replies with a fixed result.
struct RecordingUpstream {
    /// Recorded (route model, body) pairs.
    calls: Mutex<Vec<(String, Value)>>,
    /// Whether to fail every call.
    fail: bool,
}

impl RecordingUpstream {
    /// Creates a recorder that fails every call when `fail` is set.
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail,
        })
    }

    /// Returns recorded calls.
    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn complete(&self, route: &Route, body: &Value) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push((route.model.as_str().to_string(), body.clone()));
        if self.fail {
            return Err(UpstreamError::Status(503));
        }
        Ok(json!({"id": "cmpl-1", "choices": []}))
    }
}

/// Builds an `OpenAI` route with the given prices.
fn route(model: &str, cost_in: f64, cost_out: f64) -> Route {
    Route {
        model: ModelName::new(model),
        provider: ProviderKind::OpenAi,
        endpoint: "https://upstream.example/v1/completions".to_string(),
        credential_ref: None,
        models: Vec::new(),
        weight: 1,
        cost_in,
        cost_out,
    }
}

/// Builds the `acme` policy allowing `gpt-4o`.
fn policy(max_cost: f64, max_output_tokens: u32) -> TenantPolicy {
    TenantPolicy {
        tenant_id: TenantId::new("acme"),
        allow_models: ["gpt-4o"].into_iter().map(ModelName::new).collect::<BTreeSet<_>>(),
        max_request_cost: max_cost,
        max_output_tokens,
    }
}

/// Builds a router over one route and one policy.
fn router(upstream: Arc<RecordingUpstream>, policy: TenantPolicy) -> GatewayRouter {
    let store = RouteStore::new(vec![route("gpt-4o", 1.0, 2.0)], vec![policy]).unwrap();
    GatewayRouter::new(store, TraceBuffer::new(10), upstream)
}

/// Parses a request fixture.
fn request(value: &Value) -> CompletionRequest {
    CompletionRequest::from_value(value.clone()).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn plan_uses_requested_output_tokens() {
    let router = router(RecordingUpstream::new(false), policy(10.0, 1000));
    let plan = router
        .plan(
            &TenantId::new("acme"),
            &request(&json!({"model": "gpt-4o", "prompt": "abcdefgh", "max_tokens": 500})),
        )
        .unwrap();
    assert_eq!(plan.tokens_in, 2);
    assert_eq!(plan.tokens_out, 500);
    assert_eq!(plan.estimated_cost, 2.0 / 1000.0 + 1.0);
}

#[test]
fn plan_defaults_to_policy_ceiling_when_max_tokens_omitted() {
    let router = router(RecordingUpstream::new(false), policy(10.0, 800));
    let tenant = TenantId::new("acme");
    let body = json!({"model": "gpt-4o", "prompt": ""});
    assert_eq!(router.plan(&tenant, &request(&body)).unwrap().tokens_out, 800);

    let router = router.with_default_output_tokens(Some(100));
    assert_eq!(router.plan(&tenant, &request(&body)).unwrap().tokens_out, 100);

    let router = router.with_default_output_tokens(Some(5000));
    assert_eq!(router.plan(&tenant, &request(&body)).unwrap().tokens_out, 800);
}

#[test]
fn plan_rejects_output_tokens_above_ceiling() {
    let router = router(RecordingUpstream::new(false), policy(10.0, 100));
    let err = router
        .plan(
            &TenantId::new("acme"),
            &request(&json!({"model": "gpt-4o", "prompt": "x", "max_tokens": 101})),
        )
        .unwrap_err();
    assert!(matches!(err, RouteError::PolicyViolation { .. }));
}

#[test]
fn plan_rejects_requests_over_budget() {
    let router = router(RecordingUpstream::new(false), policy(0.5, 1000));
    let err = router
        .plan(
            &TenantId::new("acme"),
            &request(&json!({"model": "gpt-4o", "prompt": "x", "max_tokens": 1000})),
        )
        .unwrap_err();
    assert!(matches!(err, RouteError::BudgetExceeded { .. }));
}

#[tokio::test]
async fn dispatch_traces_and_forwards_rewritten_body() {
    let upstream = RecordingUpstream::new(false);
    let router = router(Arc::clone(&upstream), policy(10.0, 1000));
    let completion = router
        .dispatch(&TenantId::new("acme"), &request(&json!({"model": "gpt-4o", "prompt": "hi"})))
        .await
        .unwrap();

    let traces = router.traces().query(10);
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].id, completion.trace_id);
    assert_eq!(traces[0].model.as_str(), "gpt-4o");
    assert_eq!(traces[0].tenant_id.as_str(), "acme");

    let calls = upstream.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "gpt-4o");
    assert_eq!(calls[0].1["max_tokens"], 1000);
    assert_eq!(completion.response["id"], "cmpl-1");
}

#[tokio::test]
async fn rejected_requests_are_not_traced_or_dispatched() {
    let upstream = RecordingUpstream::new(false);
    let audit = Arc::new(MemoryAuditSink::<GatewayAuditEvent>::new());
    let router = router(Arc::clone(&upstream), policy(10.0, 1000)).with_audit(audit.clone());
    let err = router
        .dispatch(&TenantId::new("acme"), &request(&json!({"model": "claude", "prompt": "hi"})))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Route(RouteError::PolicyViolation { .. })));
    assert!(router.traces().is_empty());
    assert!(upstream.calls().is_empty());
    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "request_rejected");
    assert_eq!(events[0].level, AuditLevel::Warn);
}

#[tokio::test]
async fn upstream_failures_still_leave_a_trace() {
    let upstream = RecordingUpstream::new(true);
    let audit = Arc::new(MemoryAuditSink::<GatewayAuditEvent>::new());
    let router = router(Arc::clone(&upstream), policy(10.0, 1000)).with_audit(audit.clone());
    let err = router
        .dispatch(&TenantId::new("acme"), &request(&json!({"model": "gpt-4o", "prompt": "hi"})))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Upstream(UpstreamError::Status(503)));
    assert_eq!(router.traces().len(), 1);
    let events = audit.events();
    assert_eq!(events[0].event, "upstream_failed");
    assert_eq!(events[0].trace_id.as_ref(), Some(&router.traces().query(1)[0].id));
}

#[test]
fn plan_applies_the_requesting_tenants_policy() {
    let mut globex = policy(10.0, 300);
    globex.tenant_id = TenantId::new("globex");
    let store =
        RouteStore::new(vec![route("gpt-4o", 1.0, 2.0)], vec![policy(10.0, 900), globex]).unwrap();
    let router = GatewayRouter::new(store, TraceBuffer::new(10), RecordingUpstream::new(false));
    let body = request(&json!({"model": "gpt-4o", "prompt": ""}));
    assert_eq!(router.plan(&TenantId::new("acme"), &body).unwrap().tokens_out, 900);
    assert_eq!(router.plan(&TenantId::new("globex"), &body).unwrap().tokens_out, 300);
    assert!(matches!(
        router.plan(&TenantId::new("initech"), &body),
        Err(RouteError::PolicyViolation { .. })
    ));
}

#[tokio::test]
async fn alias_to_disallowed_model_is_never_dispatched() {
    let upstream = RecordingUpstream::new(false);
    let mut premium = route("gpt-4-premium", 30.0, 60.0);
    premium.models.push(ModelName::new("gpt-4o"));
    let store = RouteStore::new(vec![premium], vec![policy(1000.0, 1000)]).unwrap();
    let router = GatewayRouter::new(store, TraceBuffer::new(10), Arc::clone(&upstream) as Arc<dyn Upstream>);
    let err = router
        .dispatch(&TenantId::new("acme"), &request(&json!({"model": "gpt-4o", "prompt": "hi"})))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Route(RouteError::PolicyViolation { .. })));
    assert!(router.traces().is_empty());
    assert!(upstream.calls().is_empty());
}
