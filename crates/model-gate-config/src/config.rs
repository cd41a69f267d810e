// crates/model-gate-config/src/config.rs
// ============================================================================
// Module: Model Gate Configuration
// Description: Configuration loading and validation for Model Gate.
// Purpose: Provide strict, fail-fast config parsing with aggregated errors.
// Dependencies: model-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a hard size limit. Unknown
//! fields are rejected. [`ModelGateConfig::validate`] checks every section and
//! reports all invalid fields together, so an operator fixes a config in one
//! pass. Routes and tenant policies are read once; there is no reload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use model_gate_core::ModelName;
use model_gate_core::ProviderKind;
use model_gate_core::Route;
use model_gate_core::RouteStore;
use model_gate_core::TenantId;
use model_gate_core::TenantPolicy;
use model_gate_core::VerificationKey;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "model-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MODEL_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum allowed request body size in bytes.
pub const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Default trace buffer capacity.
pub const DEFAULT_TRACE_CAPACITY: usize = model_gate_core::MAX_TRACES;
/// Maximum allowed trace buffer capacity.
pub const MAX_TRACE_CAPACITY: usize = 10_000;
/// Default upstream request timeout in milliseconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 30_000;
/// Minimum upstream request timeout in milliseconds.
pub const MIN_UPSTREAM_TIMEOUT_MS: u64 = 100;
/// Maximum upstream request timeout in milliseconds.
pub const MAX_UPSTREAM_TIMEOUT_MS: u64 = 300_000;
/// Default route weight.
pub const DEFAULT_ROUTE_WEIGHT: u32 = 1;
/// Default per-tenant output token ceiling.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
/// Default inbound plan subject.
pub const DEFAULT_INBOUND_SUBJECT: &str = "rollout.plans";
/// Default outbound decision subject.
pub const DEFAULT_OUTBOUND_SUBJECT: &str = "rollout.decisions";
/// Default plan marker type tag.
pub const DEFAULT_PLAN_MARKER: &str = "plan.proposed";
/// Default allow marker type tag.
pub const DEFAULT_ALLOW_MARKER: &str = "plan.allow";
/// Default block marker type tag.
pub const DEFAULT_BLOCK_MARKER: &str = "plan.block";
/// Default policy request timeout in milliseconds.
pub const DEFAULT_POLICY_TIMEOUT_MS: u64 = 3_000;
/// Minimum policy request timeout in milliseconds.
pub const MIN_POLICY_TIMEOUT_MS: u64 = 100;
/// Maximum policy request timeout in milliseconds.
pub const MAX_POLICY_TIMEOUT_MS: u64 = 60_000;
/// Default messages retained per bus subscription.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;
/// Maximum messages retained per bus subscription.
pub const MAX_BUS_CAPACITY: usize = 65_536;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Model Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Gateway router configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Route table in declaration order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    /// Tenant policies.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
    /// Rollout agent configuration.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ModelGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is `path` when given, else `MODEL_GATE_CONFIG`, else
    /// `model-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::invalid("config", "file exceeds size limit"));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::invalid("config", "file must be utf-8"))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration, reporting every invalid field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing all field failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = FieldErrors::default();
        self.server.validate(&mut errors);
        self.gateway.validate(&mut errors);
        for (index, route) in self.routes.iter().enumerate() {
            route.validate(index, &mut errors);
        }
        let mut seen = BTreeSet::new();
        for (index, tenant) in self.tenants.iter().enumerate() {
            tenant.validate(index, &mut errors);
            if !seen.insert(tenant.tenant_id.as_str()) {
                errors.push(
                    format!("tenants[{index}].tenant_id"),
                    format!("duplicate tenant id {}", tenant.tenant_id),
                );
            }
        }
        self.agent.validate(&mut errors);
        self.audit.validate(&mut errors);
        errors.into_result()
    }

    /// Returns the core route records in declaration order.
    #[must_use]
    pub fn core_routes(&self) -> Vec<Route> {
        self.routes.iter().map(RouteConfig::to_route).collect()
    }

    /// Returns the core tenant policy records.
    #[must_use]
    pub fn core_policies(&self) -> Vec<TenantPolicy> {
        self.tenants.iter().map(TenantConfig::to_policy).collect()
    }

    /// Builds the read-only route store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the store rejects a record.
    pub fn route_store(&self) -> Result<RouteStore, ConfigError> {
        RouteStore::new(self.core_routes(), self.core_policies())
            .map_err(|err| ConfigError::invalid("routes", err.to_string()))
    }

    /// Returns the configured verification key, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the key cannot be decoded.
    pub fn verification_key(&self) -> Result<Option<VerificationKey>, ConfigError> {
        self.agent
            .verification
            .as_ref()
            .map(VerificationConfig::to_key)
            .transpose()
            .map_err(|err| ConfigError::invalid("agent.verification.public_key", err))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid("server.bind", "must be a socket address"))
    }

    /// Validates server configuration.
    fn validate(&self, errors: &mut FieldErrors) {
        if self.bind.trim().parse::<SocketAddr>().is_err() {
            errors.push("server.bind", "must be a socket address");
        }
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            errors.push(
                "server.max_body_bytes",
                format!("must be between 1 and {MAX_BODY_BYTES_LIMIT}"),
            );
        }
    }
}

/// Gateway router configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Trace buffer capacity.
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
    /// Upstream request timeout in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    /// Output tokens assumed when a request omits `max_tokens`.
    ///
    /// When unset, the tenant's `max_output_tokens` is assumed.
    #[serde(default)]
    pub default_output_tokens: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            trace_capacity: default_trace_capacity(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            default_output_tokens: None,
        }
    }
}

impl GatewayConfig {
    /// Validates gateway configuration.
    fn validate(&self, errors: &mut FieldErrors) {
        if self.trace_capacity == 0 || self.trace_capacity > MAX_TRACE_CAPACITY {
            errors.push(
                "gateway.trace_capacity",
                format!("must be between 1 and {MAX_TRACE_CAPACITY}"),
            );
        }
        if !(MIN_UPSTREAM_TIMEOUT_MS ..= MAX_UPSTREAM_TIMEOUT_MS)
            .contains(&self.upstream_timeout_ms)
        {
            errors.push(
                "gateway.upstream_timeout_ms",
                format!(
                    "must be between {MIN_UPSTREAM_TIMEOUT_MS} and {MAX_UPSTREAM_TIMEOUT_MS}"
                ),
            );
        }
    }
}

/// Route table entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Canonical model name served by the route.
    pub model: String,
    /// Provider flavor.
    pub provider: ProviderKind,
    /// Upstream endpoint URL.
    pub endpoint: String,
    /// Environment variable holding the upstream credential.
    #[serde(default)]
    pub credential_ref: Option<String>,
    /// Additional accepted model names.
    #[serde(default)]
    pub models: Vec<String>,
    /// Relative selection weight.
    #[serde(default = "default_route_weight")]
    pub weight: u32,
    /// Cost per 1000 input tokens.
    pub cost_in: f64,
    /// Cost per 1000 output tokens.
    pub cost_out: f64,
}

impl RouteConfig {
    /// Converts the entry into a core route.
    fn to_route(&self) -> Route {
        Route {
            model: ModelName::new(self.model.trim()),
            provider: self.provider,
            endpoint: self.endpoint.trim().to_string(),
            credential_ref: self.credential_ref.clone(),
            models: self.models.iter().map(|alias| ModelName::new(alias.trim())).collect(),
            weight: self.weight,
            cost_in: self.cost_in,
            cost_out: self.cost_out,
        }
    }

    /// Validates a route entry.
    fn validate(&self, index: usize, errors: &mut FieldErrors) {
        let field = |name: &str| format!("routes[{index}].{name}");
        if self.model.trim().is_empty() {
            errors.push(field("model"), "must be non-empty");
        }
        if self.models.iter().any(|alias| alias.trim().is_empty()) {
            errors.push(field("models"), "aliases must be non-empty");
        }
        match Url::parse(self.endpoint.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => errors.push(field("endpoint"), "must use http:// or https://"),
            Err(err) => errors.push(field("endpoint"), format!("invalid url: {err}")),
        }
        if let Some(reference) = &self.credential_ref
            && reference.trim().is_empty()
        {
            errors.push(field("credential_ref"), "must be non-empty when set");
        }
        if !self.cost_in.is_finite() || self.cost_in < 0.0 {
            errors.push(field("cost_in"), "must be a non-negative number");
        }
        if !self.cost_out.is_finite() || self.cost_out < 0.0 {
            errors.push(field("cost_out"), "must be a non-negative number");
        }
    }
}

/// Tenant policy entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Tenant identifier.
    pub tenant_id: String,
    /// Model names the tenant may request.
    #[serde(default)]
    pub allow_models: Vec<String>,
    /// Maximum estimated cost of a single request.
    pub max_request_cost: f64,
    /// Maximum output tokens per request.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl TenantConfig {
    /// Converts the entry into a core tenant policy.
    fn to_policy(&self) -> TenantPolicy {
        TenantPolicy {
            tenant_id: TenantId::new(self.tenant_id.trim()),
            allow_models: self.allow_models.iter().map(|model| ModelName::new(model.trim())).collect(),
            max_request_cost: self.max_request_cost,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Validates a tenant entry.
    fn validate(&self, index: usize, errors: &mut FieldErrors) {
        let field = |name: &str| format!("tenants[{index}].{name}");
        if self.tenant_id.trim().is_empty() {
            errors.push(field("tenant_id"), "must be non-empty");
        }
        if self.allow_models.iter().any(|model| model.trim().is_empty()) {
            errors.push(field("allow_models"), "model names must be non-empty");
        }
        if !self.max_request_cost.is_finite() || self.max_request_cost < 0.0 {
            errors.push(field("max_request_cost"), "must be a non-negative number");
        }
    }
}

/// Rollout agent configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Whether the agent runs alongside the gateway.
    #[serde(default)]
    pub enabled: bool,
    /// Bus subjects.
    #[serde(default)]
    pub subjects: AgentSubjects,
    /// Envelope type markers.
    #[serde(default)]
    pub markers: AgentMarkers,
    /// External policy-decision endpoint; absent means allow.
    #[serde(default)]
    pub policy: Option<PolicyEndpointConfig>,
    /// Envelope verification key; absent disables verification.
    #[serde(default)]
    pub verification: Option<VerificationConfig>,
    /// In-process bus sizing and HTTP egress.
    #[serde(default)]
    pub bus: AgentBusConfig,
}

impl AgentConfig {
    /// Validates agent configuration.
    fn validate(&self, errors: &mut FieldErrors) {
        check_non_empty(errors, "agent.subjects.inbound", &self.subjects.inbound);
        check_non_empty(errors, "agent.subjects.outbound", &self.subjects.outbound);
        if self.subjects.inbound.trim() == self.subjects.outbound.trim() {
            errors.push("agent.subjects.outbound", "must differ from inbound subject");
        }
        check_non_empty(errors, "agent.markers.plan", &self.markers.plan);
        check_non_empty(errors, "agent.markers.allow", &self.markers.allow);
        check_non_empty(errors, "agent.markers.block", &self.markers.block);
        if self.markers.allow.trim() == self.markers.block.trim() {
            errors.push("agent.markers.block", "must differ from allow marker");
        }
        if let Some(policy) = &self.policy {
            policy.validate(errors);
        }
        if let Some(verification) = &self.verification
            && let Err(err) = verification.to_key()
        {
            errors.push("agent.verification.public_key", err);
        }
        self.bus.validate(errors);
    }
}

/// In-process bus configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentBusConfig {
    /// Messages retained per subscription before publishers see a full error.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
    /// Retain the outbound subject for `GET /v1/bus/{subject}` consumers.
    #[serde(default = "default_bus_egress")]
    pub egress: bool,
}

impl Default for AgentBusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
            egress: default_bus_egress(),
        }
    }
}

impl AgentBusConfig {
    /// Validates bus configuration.
    fn validate(&self, errors: &mut FieldErrors) {
        if !(1 ..= MAX_BUS_CAPACITY).contains(&self.capacity) {
            errors.push("agent.bus.capacity", format!("must be between 1 and {MAX_BUS_CAPACITY}"));
        }
    }
}

/// Bus subjects used by the agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSubjects {
    /// Subject carrying inbound plan envelopes.
    #[serde(default = "default_inbound_subject")]
    pub inbound: String,
    /// Subject receiving published decisions.
    #[serde(default = "default_outbound_subject")]
    pub outbound: String,
}

impl Default for AgentSubjects {
    fn default() -> Self {
        Self {
            inbound: default_inbound_subject(),
            outbound: default_outbound_subject(),
        }
    }
}

/// Envelope type markers used by the agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentMarkers {
    /// Type tag identifying plan envelopes.
    #[serde(default = "default_plan_marker")]
    pub plan: String,
    /// Type tag on allow decisions.
    #[serde(default = "default_allow_marker")]
    pub allow: String,
    /// Type tag on block decisions.
    #[serde(default = "default_block_marker")]
    pub block: String,
}

impl Default for AgentMarkers {
    fn default() -> Self {
        Self {
            plan: default_plan_marker(),
            allow: default_allow_marker(),
            block: default_block_marker(),
        }
    }
}

/// External policy-decision endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEndpointConfig {
    /// Policy endpoint URL.
    pub url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_policy_timeout_ms")]
    pub timeout_ms: u64,
    /// Allow cleartext `http://` endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl PolicyEndpointConfig {
    /// Validates the policy endpoint.
    fn validate(&self, errors: &mut FieldErrors) {
        match Url::parse(self.url.trim()) {
            Ok(url) if url.scheme() == "https" => {}
            Ok(url) if url.scheme() == "http" => {
                if !self.allow_http {
                    errors.push("agent.policy.url", "uses http:// without allow_http");
                }
            }
            Ok(_) => errors.push("agent.policy.url", "must use http:// or https://"),
            Err(err) => errors.push("agent.policy.url", format!("invalid url: {err}")),
        }
        if !(MIN_POLICY_TIMEOUT_MS ..= MAX_POLICY_TIMEOUT_MS).contains(&self.timeout_ms) {
            errors.push(
                "agent.policy.timeout_ms",
                format!("must be between {MIN_POLICY_TIMEOUT_MS} and {MAX_POLICY_TIMEOUT_MS}"),
            );
        }
    }
}

/// Envelope verification key configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Base64-encoded 32-byte Ed25519 public key.
    pub public_key: String,
    /// Optional key identifier matched against envelope `key_id`.
    #[serde(default)]
    pub key_id: Option<String>,
}

impl VerificationConfig {
    /// Decodes the configured key.
    fn to_key(&self) -> Result<VerificationKey, String> {
        VerificationKey::from_base64(&self.public_key, self.key_id.clone())
            .map_err(|err| err.to_string())
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Discard audit events.
    None,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self, errors: &mut FieldErrors) {
        let has_path = self.path.as_deref().is_some_and(|path| !path.trim().is_empty());
        if self.sink == AuditSinkKind::File && !has_path {
            errors.push("audit.path", "required when sink is file");
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Single invalid configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path (for example `routes[0].endpoint`).
    pub field: String,
    /// Failure message.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulator for field failures during validation.
#[derive(Debug, Default)]
struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Records a failure.
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Converts collected failures into a result.
    fn into_result(self) -> Result<(), ConfigError> {
        if self.0.is_empty() { Ok(()) } else { Err(ConfigError::Invalid(self.0)) }
    }
}

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Invalid` always carries at least one field error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {}", join_field_errors(.0))]
    Invalid(Vec<FieldError>),
}

impl ConfigError {
    /// Builds an `Invalid` error for a single field.
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// Returns the field errors when this is a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::Io(_) | Self::Parse(_) => &[],
        }
    }
}

/// Renders field errors as a single `; `-separated line.
fn join_field_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        return PathBuf::from(env_path);
    }
    PathBuf::from(DEFAULT_CONFIG_NAME)
}

/// Records an error when a string field is blank.
fn check_non_empty(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "must be non-empty");
    }
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default trace capacity.
const fn default_trace_capacity() -> usize {
    DEFAULT_TRACE_CAPACITY
}

/// Default upstream timeout.
const fn default_upstream_timeout_ms() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_MS
}

/// Default route weight.
const fn default_route_weight() -> u32 {
    DEFAULT_ROUTE_WEIGHT
}

/// Default per-tenant output token ceiling.
const fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

/// Default inbound subject.
fn default_inbound_subject() -> String {
    DEFAULT_INBOUND_SUBJECT.to_string()
}

/// Default outbound subject.
fn default_outbound_subject() -> String {
    DEFAULT_OUTBOUND_SUBJECT.to_string()
}

/// Default plan marker.
fn default_plan_marker() -> String {
    DEFAULT_PLAN_MARKER.to_string()
}

/// Default allow marker.
fn default_allow_marker() -> String {
    DEFAULT_ALLOW_MARKER.to_string()
}

/// Default block marker.
fn default_block_marker() -> String {
    DEFAULT_BLOCK_MARKER.to_string()
}

/// Default policy timeout.
const fn default_policy_timeout_ms() -> u64 {
    DEFAULT_POLICY_TIMEOUT_MS
}

/// Default bus subscription capacity.
const fn default_bus_capacity() -> usize {
    DEFAULT_BUS_CAPACITY
}

/// Outbound egress is on by default.
const fn default_bus_egress() -> bool {
    true
}
