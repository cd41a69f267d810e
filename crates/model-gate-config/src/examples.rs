// crates/model-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for operators and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `model-gate.toml`. The example validates as-is; the
//! verification section is commented out because it needs a real key.

/// Returns a canonical example `model-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576

[gateway]
trace_capacity = 200
upstream_timeout_ms = 30000
# default_output_tokens = 512

[[routes]]
model = "gpt-4o"
provider = "openai"
endpoint = "https://api.openai.com/v1/chat/completions"
credential_ref = "OPENAI_API_KEY"
models = ["gpt-4o-latest"]
weight = 2
cost_in = 0.0025
cost_out = 0.01

[[routes]]
model = "gpt-4o"
provider = "generic"
endpoint = "https://llm-proxy.internal.example/v1/chat/completions"
weight = 1
cost_in = 0.002
cost_out = 0.008

[[routes]]
model = "claude-sonnet"
provider = "anthropic"
endpoint = "https://api.anthropic.com/v1/messages"
credential_ref = "ANTHROPIC_API_KEY"
cost_in = 0.003
cost_out = 0.015

[[tenants]]
tenant_id = "acme"
allow_models = ["gpt-4o", "gpt-4o-latest", "claude-sonnet"]
max_request_cost = 0.5
max_output_tokens = 4096

[agent]
enabled = true

[agent.subjects]
inbound = "rollout.plans"
outbound = "rollout.decisions"

[agent.markers]
plan = "plan.proposed"
allow = "plan.allow"
block = "plan.block"

[agent.bus]
capacity = 1024
egress = true

[agent.policy]
url = "https://opa.internal.example/v1/data/rollout/allow"
timeout_ms = 3000

# [agent.verification]
# public_key = "<base64 ed25519 public key>"
# key_id = "release-2026"

[audit]
sink = "stderr"
"#,
    )
}
