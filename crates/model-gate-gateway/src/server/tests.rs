// crates/model-gate-gateway/src/server/tests.rs
// ============================================================================
// Module: HTTP Surface Unit Tests
// Description: Tests for header parsing and error status mapping.
// Purpose: Pin the status code contract for gateway errors.
// Dependencies: model-gate-gateway, axum
// ============================================================================

//! ## Overview
//! Covers tenant header extraction and error-to-status mapping.

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
    reason = "Test-only server assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use model_gate_core::ModelName;
use model_gate_core::RouteError;
use model_gate_core::TenantId;

use super::TENANT_HEADER;
use super::error_status;
use super::tenant_from_headers;
use crate::request::RequestError;
use crate::router::GatewayError;
use crate::upstream::UpstreamError;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn tenant_header_is_trimmed() {
    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_static(" acme "));
    assert_eq!(tenant_from_headers(&headers), Some(TenantId::new("acme")));
}

#[test]
fn blank_or_missing_tenant_header_is_absent() {
    let mut headers = HeaderMap::new();
    assert_eq!(tenant_from_headers(&headers), None);
    headers.insert(TENANT_HEADER, HeaderValue::from_static("   "));
    assert_eq!(tenant_from_headers(&headers), None);
}

#[test]
fn gateway_errors_map_to_status_codes() {
    let tenant_id = TenantId::new("acme");
    let cases = [
        (GatewayError::BadRequest(RequestError::MissingModel), StatusCode::BAD_REQUEST),
        (
            GatewayError::Route(RouteError::PolicyViolation {
                tenant_id: tenant_id.clone(),
                reason: "unknown tenant".to_string(),
            }),
            StatusCode::FORBIDDEN,
        ),
        (
            GatewayError::Route(RouteError::NoMatchingRoute {
                model: ModelName::new("m"),
            }),
            StatusCode::NOT_FOUND,
        ),
        (
            GatewayError::Route(RouteError::BudgetExceeded {
                tenant_id,
                estimated: 2.0,
                limit: 1.0,
            }),
            StatusCode::PAYMENT_REQUIRED,
        ),
        (GatewayError::Upstream(UpstreamError::Status(500)), StatusCode::BAD_GATEWAY),
    ];
    for (err, expected) in cases {
        assert_eq!(error_status(&err).0, expected, "{err}");
    }
}
