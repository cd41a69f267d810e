// crates/model-gate-gateway/tests/common/mod.rs
// =============================================================================
// Module: Gateway Test Helpers
// Description: Fake upstream servers and gateway fixtures for HTTP tests.
// Purpose: Reduce duplication across gateway integration tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Test helpers panic on setup failure.")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use model_gate_agent::MessageBus;
use model_gate_agent::Outbox;
use model_gate_core::ModelName;
use model_gate_core::ProviderKind;
use model_gate_core::Route;
use model_gate_core::RouteStore;
use model_gate_core::TenantId;
use model_gate_core::TenantPolicy;
use model_gate_core::TraceBuffer;
use model_gate_gateway::GatewayRouter;
use model_gate_gateway::GatewayState;
use model_gate_gateway::HttpUpstream;
use model_gate_gateway::StaticCredentials;
use serde_json::Value;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Tenant used by every fixture.
pub const TENANT: &str = "acme";

/// Request captured by a fake upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Lowercased header names with their values.
    pub headers: Vec<(String, String)>,
    /// Parsed JSON body.
    pub body: Value,
}

impl CapturedRequest {
    /// Returns the first value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Spawns an upstream answering one request; returns its URL and the
/// receiver for the request it saw.
pub fn spawn_upstream(reply: &'static str, status: u16) -> (String, mpsc::Receiver<CapturedRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/v1/chat/completions");
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let headers = request
                .headers()
                .iter()
                .map(|header| (header.field.to_string().to_ascii_lowercase(), header.value.to_string()))
                .collect();
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let body = serde_json::from_str(&raw).unwrap_or(Value::Null);
            let _ = sender.send(CapturedRequest {
                headers,
                body,
            });
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(reply).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    (url, receiver)
}

/// Builds a route for `model` at `endpoint`.
pub fn route(model: &str, provider: ProviderKind, endpoint: &str, credential_ref: &str) -> Route {
    Route {
        model: ModelName::new(model),
        provider,
        endpoint: endpoint.to_string(),
        credential_ref: Some(credential_ref.to_string()),
        models: Vec::new(),
        weight: 1,
        cost_in: 1.0,
        cost_out: 2.0,
    }
}

/// Builds the fixture tenant policy.
pub fn policy(models: &[&str]) -> TenantPolicy {
    TenantPolicy {
        tenant_id: TenantId::new(TENANT),
        allow_models: models.iter().map(|model| ModelName::new(*model)).collect::<BTreeSet<_>>(),
        max_request_cost: 1.0,
        max_output_tokens: 1000,
    }
}

/// Builds gateway state over `routes` with fixed credentials.
pub fn state(
    routes: Vec<Route>,
    policy: TenantPolicy,
    bus: Option<Arc<dyn MessageBus>>,
    max_body_bytes: usize,
) -> Arc<GatewayState> {
    state_with_egress(routes, policy, bus, Vec::new(), max_body_bytes)
}

/// Builds gateway state that also serves `egress` subjects over HTTP.
pub fn state_with_egress(
    routes: Vec<Route>,
    policy: TenantPolicy,
    bus: Option<Arc<dyn MessageBus>>,
    egress: Vec<Outbox>,
    max_body_bytes: usize,
) -> Arc<GatewayState> {
    let store = RouteStore::new(routes, vec![policy]).unwrap();
    let credentials = StaticCredentials::new()
        .with("OPENAI_KEY", "sk-openai")
        .with("ANTHROPIC_KEY", "sk-anthropic");
    let upstream =
        HttpUpstream::with_credentials(Duration::from_secs(5), Box::new(credentials)).unwrap();
    let router = GatewayRouter::new(store, TraceBuffer::new(200), Arc::new(upstream));
    Arc::new(GatewayState {
        router,
        bus,
        egress: egress
            .into_iter()
            .map(|outbox| (outbox.subject().to_string(), Arc::new(outbox)))
            .collect::<BTreeMap<_, _>>(),
        max_body_bytes,
    })
}

/// Running gateway bound to an ephemeral port.
pub struct RunningGateway {
    /// Base URL, e.g. `http://127.0.0.1:1234`.
    pub base_url: String,
    /// Shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
}

impl RunningGateway {
    /// Returns an absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Starts the gateway HTTP surface on an ephemeral port.
pub async fn start_gateway(state: Arc<GatewayState>) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (sender, receiver) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = model_gate_gateway::serve(listener, state, async {
            let _ = receiver.await;
        })
        .await;
    });
    RunningGateway {
        base_url: format!("http://{addr}"),
        shutdown: Some(sender),
    }
}
