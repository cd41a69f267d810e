// crates/model-gate-gateway/src/server.rs
// ============================================================================
// Module: Model Gate HTTP Surface
// Description: axum routes for completions, traces, and bus ingress.
// Purpose: Expose the gateway router and in-process bus over HTTP.
// Dependencies: axum, model-gate-agent, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `POST /v1/completions`: tenant from `x-tenant-id`, forwards upstream.
//! - `GET /v1/traces?limit=n`: recent dispatch records, newest first.
//! - `POST /v1/bus/{subject}`: publishes a JSON envelope onto the bus.
//! - `GET /v1/bus/{subject}?max=n&wait_ms=m`: drains retained messages from
//!   an egress subject, long-polling up to `wait_ms` for the first one.
//! - `GET /healthz`: liveness.
//!
//! Errors are JSON `{"error": {"kind", "message"}}` with status codes 400,
//! 402, 403, 404, 413, 502, and 503.
//! Security posture: request bodies are bounded before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use model_gate_agent::BusError;
use model_gate_agent::MessageBus;
use model_gate_agent::Outbox;
use model_gate_core::RouteError;
use model_gate_core::TenantId;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::request::CompletionRequest;
use crate::router::GatewayError;
use crate::router::GatewayRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the requesting tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Response header carrying the dispatch trace id.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Largest trace query served in one response.
pub const MAX_TRACE_QUERY: usize = 200;

/// Largest number of messages drained from an egress subject per request.
pub const MAX_EGRESS_BATCH: usize = 100;

/// Longest long-poll wait on an egress subject.
pub const MAX_EGRESS_WAIT_MS: u64 = 30_000;

// ============================================================================
// SECTION: State and Errors
// ============================================================================

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Gateway router.
    pub router: GatewayRouter,
    /// In-process bus for operator ingress; `None` disables the bus route.
    pub bus: Option<Arc<dyn MessageBus>>,
    /// Retained subjects readable over HTTP, keyed by subject.
    pub egress: BTreeMap<String, Arc<Outbox>>,
    /// Maximum allowed request body size.
    pub max_body_bytes: usize,
}

/// HTTP server failures.
#[derive(Debug, Error)]
pub enum GatewayServerError {
    /// Listener could not be bound.
    #[error("failed to bind {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Failure detail.
        message: String,
    },
    /// Server loop failed.
    #[error("http server failed: {0}")]
    Serve(String),
}

/// Trace query parameters.
#[derive(Debug, Deserialize)]
struct TraceQuery {
    /// Requested number of traces.
    limit: Option<usize>,
}

/// Egress drain parameters.
#[derive(Debug, Deserialize)]
struct EgressQuery {
    /// Maximum messages to return.
    max: Option<usize>,
    /// Long-poll wait for the first message, in milliseconds.
    wait_ms: Option<u64>,
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Builds the gateway HTTP application.
pub fn app(state: Arc<GatewayState>) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/v1/completions", post(handle_completion))
        .route("/v1/traces", get(handle_traces))
        .route("/v1/bus/{subject}", post(handle_bus_publish).get(handle_bus_drain))
        .route("/healthz", get(handle_health))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Binds a TCP listener.
///
/// # Errors
///
/// Returns [`GatewayServerError::Bind`] when the address cannot be bound.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, GatewayServerError> {
    TcpListener::bind(addr).await.map_err(|err| GatewayServerError::Bind {
        addr,
        message: err.to_string(),
    })
}

/// Serves the gateway until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`GatewayServerError::Serve`] when the server loop fails.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<GatewayState>,
    shutdown: F,
) -> Result<(), GatewayServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| GatewayServerError::Serve(err.to_string()))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles completion requests.
async fn handle_completion(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    if bytes.len() > state.max_body_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "request body too large",
        );
    }
    let Some(tenant_id) = tenant_from_headers(&headers) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_tenant",
            "x-tenant-id header is required",
        );
    };
    let request = match CompletionRequest::from_slice(&bytes) {
        Ok(request) => request,
        Err(err) => return gateway_error_response(&GatewayError::BadRequest(err)),
    };
    match state.router.dispatch(&tenant_id, &request).await {
        Ok(completion) => (
            StatusCode::OK,
            [(TRACE_HEADER, completion.trace_id.as_str().to_string())],
            axum::Json(completion.response),
        )
            .into_response(),
        Err(err) => gateway_error_response(&err),
    }
}

/// Handles trace queries.
async fn handle_traces(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<TraceQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(MAX_TRACE_QUERY).min(MAX_TRACE_QUERY);
    let traces = state.router.traces().query(limit);
    (StatusCode::OK, axum::Json(json!({ "traces": traces }))).into_response()
}

/// Handles bus ingress.
async fn handle_bus_publish(
    State(state): State<Arc<GatewayState>>,
    Path(subject): Path<String>,
    bytes: Bytes,
) -> Response {
    let Some(bus) = &state.bus else {
        return error_response(StatusCode::NOT_FOUND, "bus_disabled", "bus ingress is disabled");
    };
    if bytes.len() > state.max_body_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "request body too large",
        );
    }
    if let Err(err) = serde_json::from_slice::<Value>(&bytes) {
        return error_response(StatusCode::BAD_REQUEST, "invalid_json", &err.to_string());
    }
    match bus.publish(&subject, bytes.to_vec()).await {
        Ok(()) => (StatusCode::ACCEPTED, axum::Json(json!({ "published": true }))).into_response(),
        Err(err @ BusError::InvalidSubject(_)) => {
            error_response(StatusCode::BAD_REQUEST, "invalid_subject", &err.to_string())
        }
        Err(err @ BusError::NoSubscribers(_)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "no_subscribers", &err.to_string())
        }
        Err(err) => error_response(StatusCode::SERVICE_UNAVAILABLE, "bus_error", &err.to_string()),
    }
}

/// Handles bus egress drains.
async fn handle_bus_drain(
    State(state): State<Arc<GatewayState>>,
    Path(subject): Path<String>,
    Query(query): Query<EgressQuery>,
) -> Response {
    let Some(outbox) = state.egress.get(&subject) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "no_egress",
            &format!("subject {subject} is not retained for egress"),
        );
    };
    let max = query.max.unwrap_or(MAX_EGRESS_BATCH).min(MAX_EGRESS_BATCH);
    let wait = Duration::from_millis(query.wait_ms.unwrap_or(0).min(MAX_EGRESS_WAIT_MS));
    let messages: Vec<Value> = outbox
        .drain(max, wait)
        .await
        .into_iter()
        .map(|message| {
            serde_json::from_slice(&message.payload).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&message.payload).into_owned())
            })
        })
        .collect();
    (StatusCode::OK, axum::Json(json!({ "subject": outbox.subject(), "messages": messages })))
        .into_response()
}

/// Handles liveness probes.
async fn handle_health() -> Response {
    (StatusCode::OK, axum::Json(json!({ "status": "ok" }))).into_response()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a non-blank tenant id from request headers.
fn tenant_from_headers(headers: &HeaderMap) -> Option<TenantId> {
    headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(TenantId::new)
}

/// Maps a gateway error to its HTTP status and kind label.
const fn error_status(err: &GatewayError) -> (StatusCode, &'static str) {
    match err {
        GatewayError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        GatewayError::Route(RouteError::PolicyViolation { .. }) => {
            (StatusCode::FORBIDDEN, "policy_violation")
        }
        GatewayError::Route(RouteError::NoMatchingRoute { .. }) => {
            (StatusCode::NOT_FOUND, "no_matching_route")
        }
        GatewayError::Route(RouteError::BudgetExceeded { .. }) => {
            (StatusCode::PAYMENT_REQUIRED, "budget_exceeded")
        }
        GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
    }
}

/// Builds the JSON response for a gateway error.
fn gateway_error_response(err: &GatewayError) -> Response {
    let (status, kind) = error_status(err);
    error_response(status, kind, &err.to_string())
}

/// Builds a JSON error response.
fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, axum::Json(json!({ "error": { "kind": kind, "message": message } }))).into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
