// crates/model-gate-gateway/src/upstream.rs
// ============================================================================
// Module: Model Gate Upstream Providers
// Description: HTTP dispatch of completion requests to upstream providers.
// Purpose: Present route credentials per provider kind and forward payloads.
// Dependencies: async-trait, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpUpstream`] posts the rewritten request body to a route's endpoint.
//! Credentials are resolved by name through a [`CredentialSource`]; `openai`
//! and `generic` routes send a bearer token, `anthropic` routes send
//! `x-api-key` with a pinned `anthropic-version`.
//! Security posture: credential values are never included in errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use model_gate_core::ProviderKind;
use model_gate_core::Route;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// API version header value sent to Anthropic endpoints.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream dispatch failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never contain credential values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// HTTP client could not be constructed.
    #[error("upstream client setup failed: {0}")]
    Setup(String),
    /// The route's credential reference did not resolve.
    #[error("credential {0} is not available")]
    MissingCredential(String),
    /// Request exceeded its timeout.
    #[error("upstream request timed out after {0} ms")]
    Timeout(u128),
    /// Transport-level failure.
    #[error("upstream request failed: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("upstream returned status {0}")]
    Status(u16),
    /// Response body was not JSON.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Resolves credential references to secret values.
pub trait CredentialSource: Send + Sync {
    /// Returns the secret for `reference`, if any.
    fn resolve(&self, reference: &str) -> Option<String>;
}

/// Credential source reading environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn resolve(&self, reference: &str) -> Option<String> {
        std::env::var(reference).ok().filter(|value| !value.is_empty())
    }
}

/// Fixed credential map.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    /// Secrets keyed by reference.
    secrets: BTreeMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty credential map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret.
    #[must_use]
    pub fn with(mut self, reference: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(reference.into(), secret.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn resolve(&self, reference: &str) -> Option<String> {
        self.secrets.get(reference).cloned()
    }
}

/// Builds provider-specific authentication headers.
#[must_use]
pub fn auth_headers(provider: ProviderKind, credential: &str) -> Vec<(&'static str, String)> {
    match provider {
        ProviderKind::OpenAi | ProviderKind::Generic => {
            vec![("authorization", format!("Bearer {credential}"))]
        }
        ProviderKind::Anthropic => vec![
            ("x-api-key", credential.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ],
    }
}

// ============================================================================
// SECTION: Upstream Trait
// ============================================================================

/// Upstream completion backend.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Sends `body` to the route's provider and returns its JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the provider call fails.
    async fn complete(&self, route: &Route, body: &Value) -> Result<Value, UpstreamError>;
}

// ============================================================================
// SECTION: HTTP Upstream
// ============================================================================

/// Upstream backend over HTTP.
pub struct HttpUpstream {
    /// HTTP client configured with the timeout.
    client: Client,
    /// Request timeout.
    timeout: Duration,
    /// Credential resolver.
    credentials: Box<dyn CredentialSource>,
}

impl HttpUpstream {
    /// Builds an upstream bounded by `timeout` that reads credentials from
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Setup`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        Self::with_credentials(timeout, Box::new(EnvCredentials))
    }

    /// Builds an upstream with an explicit credential source.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Setup`] when the HTTP client cannot be built.
    pub fn with_credentials(
        timeout: Duration,
        credentials: Box<dyn CredentialSource>,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| UpstreamError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            timeout,
            credentials,
        })
    }

    /// Maps a reqwest failure to an upstream error, dropping the URL.
    fn map_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout.as_millis())
        } else {
            UpstreamError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn complete(&self, route: &Route, body: &Value) -> Result<Value, UpstreamError> {
        let mut request = self.client.post(&route.endpoint).json(body);
        if let Some(reference) = &route.credential_ref {
            let secret = self
                .credentials
                .resolve(reference)
                .ok_or_else(|| UpstreamError::MissingCredential(reference.clone()))?;
            for (name, value) in auth_headers(route.provider, &secret) {
                request = request.header(name, value);
            }
        }
        let response = request.send().await.map_err(|err| self.map_error(err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response.json::<Value>().await.map_err(|err| match self.map_error(err) {
            UpstreamError::Transport(message) => UpstreamError::Malformed(message),
            other => other,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
