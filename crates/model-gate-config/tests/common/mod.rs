// crates/model-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for model-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use model_gate_config::ConfigError;
use model_gate_config::ModelGateConfig;

/// Minimal valid route and tenant tables.
pub const MINIMAL_TABLES: &str = r#"
[[routes]]
model = "gpt-4o"
provider = "openai"
endpoint = "https://api.example.com/v1/chat/completions"
cost_in = 1.0
cost_out = 2.0

[[tenants]]
tenant_id = "acme"
allow_models = ["gpt-4o"]
max_request_cost = 0.5
"#;

/// Parses a TOML string into a `ModelGateConfig` without validation.
pub fn config_from_toml(toml_str: &str) -> Result<ModelGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal valid config.
pub fn minimal_config() -> Result<ModelGateConfig, toml::de::Error> {
    config_from_toml(MINIMAL_TABLES)
}

/// Returns the field paths reported by a validation failure.
pub fn invalid_fields(result: Result<(), ConfigError>) -> Result<Vec<String>, String> {
    match result {
        Err(ConfigError::Invalid(errors)) => Ok(errors.into_iter().map(|error| error.field).collect()),
        Err(other) => Err(format!("expected invalid config, got {other}")),
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
