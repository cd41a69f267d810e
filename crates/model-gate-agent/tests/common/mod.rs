// crates/model-gate-agent/tests/common/mod.rs
// =============================================================================
// Module: Agent Test Helpers
// Description: Envelope builders and fake policy servers for agent tests.
// Purpose: Reduce duplication across rollout agent integration tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Test helpers panic on setup failure.")]

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use model_gate_core::Envelope;
use model_gate_core::VerificationKey;
use model_gate_core::sign_envelope_data;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Plan marker used by default agent settings.
pub const PLAN_MARKER: &str = "plan.proposed";

/// Returns a deterministic signing key.
pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42_u8; 32])
}

/// Returns the verification key paired with [`signing_key`].
pub fn verification_key() -> VerificationKey {
    VerificationKey::new(signing_key().verifying_key(), None)
}

/// Returns plan data for `plan_id`.
pub fn plan_data(plan_id: &str) -> Value {
    json!({"plan": {"id": plan_id, "service": "checkout", "percent": 10}})
}

/// Builds a plan envelope signed with [`signing_key`].
pub fn signed_plan(plan_id: &str) -> Vec<u8> {
    let data = plan_data(plan_id);
    let signature = sign_envelope_data(&data, &signing_key()).unwrap();
    encode(&Envelope {
        kind: PLAN_MARKER.to_string(),
        data,
        signature: Some(signature),
        key_id: None,
    })
}

/// Builds an unsigned envelope of the given type.
pub fn unsigned(kind: &str, data: Value) -> Vec<u8> {
    encode(&Envelope {
        kind: kind.to_string(),
        data,
        signature: None,
        key_id: None,
    })
}

/// Serializes an envelope.
pub fn encode(envelope: &Envelope) -> Vec<u8> {
    serde_json::to_vec(envelope).unwrap()
}

/// Spawns a policy server answering one request; returns its URL and the
/// receiver for the request body it saw.
pub fn spawn_policy_server(body: &'static str, status: u16) -> (String, mpsc::Receiver<Value>) {
    spawn_policy_server_with_delay(body, status, Duration::ZERO)
}

/// Spawns a policy server that waits `delay` before answering.
pub fn spawn_policy_server_with_delay(
    body: &'static str,
    status: u16,
    delay: Duration,
) -> (String, mpsc::Receiver<Value>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/v1/data/rollout/allow");
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            if let Ok(value) = serde_json::from_str(&raw) {
                let _ = sender.send(value);
            }
            thread::sleep(delay);
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(body).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    (url, receiver)
}

/// Returns a URL on a local port with no listener.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v1/data/rollout/allow")
}
