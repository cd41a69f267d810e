// crates/model-gate-cli/src/runtime.rs
// ============================================================================
// Module: Model Gate Runtime Assembly
// Description: Builds and runs the gateway and rollout agent from config.
// Purpose: Wire configuration, audit sinks, bus, and servers together.
// Dependencies: model-gate-config, model-gate-gateway, model-gate-agent, tokio
// ============================================================================

//! ## Overview
//! [`build_runtime`] converts a validated [`ModelGateConfig`] into a
//! [`Runtime`]: gateway state, an optional rollout agent, and the shared
//! in-process bus. When the agent runs with `agent.bus.egress`, the outbound
//! subject is retained in an [`Outbox`] served at `GET /v1/bus/{subject}`, so
//! every published decision has a consumer. [`run`] serves HTTP until the
//! shutdown future resolves, then signals the agent and waits for it to drain
//! its current message.
//! Invariants:
//! - A failed agent or egress subscription aborts startup before HTTP is
//!   served.
//! - Both audit streams share one sink instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use model_gate_agent::AgentAuditEvent;
use model_gate_agent::AgentError;
use model_gate_agent::AgentSettings;
use model_gate_agent::BusError;
use model_gate_agent::DecisionMarkers;
use model_gate_agent::HttpPolicyClient;
use model_gate_agent::InMemoryBus;
use model_gate_agent::MessageBus;
use model_gate_agent::Outbox;
use model_gate_agent::PolicyClient;
use model_gate_agent::PolicyClientError;
use model_gate_agent::RolloutAgent;
use model_gate_config::AuditConfig;
use model_gate_config::AuditSinkKind;
use model_gate_config::ConfigError;
use model_gate_config::ModelGateConfig;
use model_gate_core::AuditSink;
use model_gate_core::FileAuditSink;
use model_gate_core::NoopAuditSink;
use model_gate_core::StderrAuditSink;
use model_gate_core::TraceBuffer;
use model_gate_gateway::GatewayAuditEvent;
use model_gate_gateway::GatewayRouter;
use model_gate_gateway::GatewayServerError;
use model_gate_gateway::GatewayState;
use model_gate_gateway::HttpUpstream;
use model_gate_gateway::UpstreamError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Runtime assembly and execution failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Audit file could not be opened.
    #[error("failed to open audit log {path}: {message}")]
    Audit {
        /// Audit log path.
        path: String,
        /// Failure detail.
        message: String,
    },
    /// Upstream HTTP client could not be built.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Policy HTTP client could not be built.
    #[error(transparent)]
    Policy(#[from] PolicyClientError),
    /// Egress subscription could not be established.
    #[error("failed to retain {subject} for egress: {source}")]
    Egress {
        /// Egress subject.
        subject: String,
        /// Bus failure.
        source: BusError,
    },
    /// Rollout agent failed to start.
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// HTTP server failed.
    #[error(transparent)]
    Server(#[from] GatewayServerError),
    /// Agent task ended abnormally.
    #[error("rollout agent task failed: {0}")]
    AgentTask(String),
}

// ============================================================================
// SECTION: Audit Sinks
// ============================================================================

/// Audit sinks for both event streams.
#[derive(Clone)]
pub struct AuditSinks {
    /// Gateway request events.
    pub gateway: Arc<dyn AuditSink<GatewayAuditEvent>>,
    /// Rollout agent events.
    pub agent: Arc<dyn AuditSink<AgentAuditEvent>>,
}

/// Builds audit sinks from configuration.
///
/// # Errors
///
/// Returns [`RuntimeError::Audit`] when the audit file cannot be opened.
pub fn audit_sinks(config: &AuditConfig) -> Result<AuditSinks, RuntimeError> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(AuditSinks {
            gateway: Arc::new(StderrAuditSink),
            agent: Arc::new(StderrAuditSink),
        }),
        AuditSinkKind::None => Ok(AuditSinks {
            gateway: Arc::new(NoopAuditSink),
            agent: Arc::new(NoopAuditSink),
        }),
        AuditSinkKind::File => {
            let path = config.path.as_deref().unwrap_or_default();
            let sink = FileAuditSink::new(Path::new(path)).map_err(|err| RuntimeError::Audit {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            let sink = Arc::new(sink);
            Ok(AuditSinks {
                gateway: sink.clone(),
                agent: sink,
            })
        }
    }
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Assembled gateway and agent ready to run.
pub struct Runtime {
    /// Address the gateway binds to.
    pub bind: SocketAddr,
    /// Shared gateway state.
    pub state: Arc<GatewayState>,
    /// In-process bus shared by the gateway ingress and the agent.
    pub bus: Arc<InMemoryBus>,
    /// Rollout agent when enabled.
    pub agent: Option<RolloutAgent>,
}

/// Builds a runtime from configuration.
///
/// # Errors
///
/// Returns [`RuntimeError`] when any component cannot be constructed.
pub async fn build_runtime(config: &ModelGateConfig) -> Result<Runtime, RuntimeError> {
    let bind = config.server.bind_addr()?;
    let sinks = audit_sinks(&config.audit)?;
    let store = config.route_store()?;
    let upstream =
        HttpUpstream::new(Duration::from_millis(config.gateway.upstream_timeout_ms))?;
    let router = GatewayRouter::new(
        store,
        TraceBuffer::new(config.gateway.trace_capacity),
        Arc::new(upstream),
    )
    .with_audit(sinks.gateway)
    .with_default_output_tokens(config.gateway.default_output_tokens);
    let bus = Arc::new(InMemoryBus::new(config.agent.bus.capacity));
    let shared_bus: Arc<dyn MessageBus> = bus.clone();
    let mut egress = BTreeMap::new();
    let agent = if config.agent.enabled {
        if config.agent.bus.egress {
            let subject = config.agent.subjects.outbound.clone();
            let outbox = Outbox::attach(bus.as_ref(), &subject).await.map_err(|source| {
                RuntimeError::Egress {
                    subject: subject.clone(),
                    source,
                }
            })?;
            egress.insert(subject, Arc::new(outbox));
        }
        Some(build_agent(config, shared_bus.clone(), sinks.agent)?)
    } else {
        None
    };
    let state = Arc::new(GatewayState {
        router,
        bus: Some(shared_bus),
        egress,
        max_body_bytes: config.server.max_body_bytes,
    });
    Ok(Runtime {
        bind,
        state,
        bus,
        agent,
    })
}

/// Builds the rollout agent from the `[agent]` section.
fn build_agent(
    config: &ModelGateConfig,
    bus: Arc<dyn MessageBus>,
    audit: Arc<dyn AuditSink<AgentAuditEvent>>,
) -> Result<RolloutAgent, RuntimeError> {
    let agent = &config.agent;
    let settings = AgentSettings {
        inbound_subject: agent.subjects.inbound.clone(),
        outbound_subject: agent.subjects.outbound.clone(),
        plan_marker: agent.markers.plan.clone(),
        markers: DecisionMarkers {
            allow: agent.markers.allow.clone(),
            block: agent.markers.block.clone(),
        },
    };
    let policy = match &agent.policy {
        Some(policy) => {
            let client =
                HttpPolicyClient::new(policy.url.clone(), Duration::from_millis(policy.timeout_ms))?;
            Some(Arc::new(client) as Arc<dyn PolicyClient>)
        }
        None => None,
    };
    Ok(RolloutAgent::new(bus, settings)
        .with_verification_key(config.verification_key()?)
        .with_policy_client(policy)
        .with_audit(audit))
}

/// Binds the configured address and runs until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`RuntimeError`] when binding, agent startup, or serving fails.
pub async fn run<F>(runtime: Runtime, shutdown: F) -> Result<(), RuntimeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = model_gate_gateway::bind(runtime.bind).await?;
    run_with_listener(runtime, listener, shutdown).await
}

/// Runs on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`RuntimeError`] when agent startup or serving fails.
pub async fn run_with_listener<F>(
    runtime: Runtime,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), RuntimeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stop_agent, agent_shutdown) = watch::channel(false);
    let agent_task = match runtime.agent {
        Some(agent) => Some(agent.start(agent_shutdown).await?),
        None => None,
    };
    let served = model_gate_gateway::serve(listener, runtime.state, shutdown).await;
    let _ = stop_agent.send(true);
    if let Some(task) = agent_task {
        task.await.map_err(|err| RuntimeError::AgentTask(err.to_string()))?;
    }
    served.map_err(RuntimeError::from)
}
