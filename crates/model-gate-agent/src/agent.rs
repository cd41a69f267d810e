// crates/model-gate-agent/src/agent.rs
// ============================================================================
// Module: Model Gate Rollout Agent
// Description: Sequential bus consumer that authorizes rollout plans.
// Purpose: Verify, evaluate, and publish one decision per plan envelope.
// Dependencies: model-gate-core, serde, tokio
// ============================================================================

//! ## Overview
//! [`RolloutAgent`] walks each inbound message through
//! parse, type filter, verify, policy check, decide, and publish. Any stage
//! that rejects the message ends its processing without a decision; the loop
//! moves on to the next message.
//! Invariants:
//! - At most one decision is published per message.
//! - No decision is published for non-plan or unverified envelopes.
//! - Only a subscription failure at start is fatal.
//! - Shutdown is observed between messages; an in-flight message completes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use model_gate_core::AuditLevel;
use model_gate_core::AuditSink;
use model_gate_core::Envelope;
use model_gate_core::NoopAuditSink;
use model_gate_core::PlanId;
use model_gate_core::VerificationKey;
use model_gate_core::timestamp_ms;
use model_gate_core::verify_with_key;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::BusError;
use crate::bus::MessageBus;
use crate::bus::Subscription;
use crate::decision::Decision;
use crate::decision::DecisionMarkers;
use crate::decision::DecisionOutcome;
use crate::decision::decide;
use crate::policy::PolicyClient;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Subjects and markers used by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Subject carrying inbound envelopes.
    pub inbound_subject: String,
    /// Subject receiving decisions.
    pub outbound_subject: String,
    /// Type tag identifying plan envelopes.
    pub plan_marker: String,
    /// Type tags placed on decisions.
    pub markers: DecisionMarkers,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            inbound_subject: "rollout.plans".to_string(),
            outbound_subject: "rollout.decisions".to_string(),
            plan_marker: "plan.proposed".to_string(),
            markers: DecisionMarkers {
                allow: "plan.allow".to_string(),
                block: "plan.block".to_string(),
            },
        }
    }
}

// ============================================================================
// SECTION: Outcomes and Errors
// ============================================================================

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Payload was not a usable envelope; discarded.
    Malformed(String),
    /// Envelope type is not the plan marker; discarded silently.
    Ignored,
    /// Signature verification failed; discarded without a decision.
    Rejected(String),
    /// A decision was produced.
    Decided {
        /// Decision for the plan.
        decision: Decision,
        /// Whether publishing succeeded.
        published: bool,
    },
}

/// Message tallies for one agent run, reported when the agent stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages taken off the inbound subscription.
    pub received: u64,
    /// Envelopes that were not plans.
    pub ignored: u64,
    /// Payloads that could not be parsed.
    pub malformed: u64,
    /// Envelopes that failed verification.
    pub rejected: u64,
    /// Decisions produced.
    pub decided: u64,
    /// Decisions successfully published.
    pub published: u64,
}

impl RunSummary {
    /// Counts one processed message.
    pub const fn observe(&mut self, outcome: &MessageOutcome) {
        self.received += 1;
        match outcome {
            MessageOutcome::Ignored => self.ignored += 1,
            MessageOutcome::Malformed(_) => self.malformed += 1,
            MessageOutcome::Rejected(_) => self.rejected += 1,
            MessageOutcome::Decided {
                published,
                ..
            } => {
                self.decided += 1;
                if *published {
                    self.published += 1;
                }
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} decided={} published={} ignored={} malformed={} rejected={}",
            self.received, self.decided, self.published, self.ignored, self.malformed, self.rejected
        )
    }
}

/// Rollout agent failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Inbound subscription could not be established.
    #[error("failed to subscribe to {subject}: {source}")]
    Subscribe {
        /// Inbound subject.
        subject: String,
        /// Bus failure.
        source: BusError,
    },
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Rollout agent audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: AuditLevel,
    /// Bus subject when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Plan identifier when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<PlanId>,
    /// Decision outcome when one was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DecisionOutcome>,
    /// Failure or decision detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AgentAuditEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, level: AuditLevel) -> Self {
        Self {
            event,
            timestamp_ms: timestamp_ms(),
            level,
            subject: None,
            plan_id: None,
            outcome: None,
            detail: None,
        }
    }

    /// Attaches a subject.
    #[must_use]
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Attaches a plan id.
    #[must_use]
    pub fn with_plan(mut self, plan_id: &PlanId) -> Self {
        self.plan_id = Some(plan_id.clone());
        self
    }

    /// Attaches detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Rollout Agent
// ============================================================================

/// Bus consumer authorizing rollout plans.
pub struct RolloutAgent {
    /// Message bus used to subscribe and publish.
    bus: Arc<dyn MessageBus>,
    /// Subjects and markers.
    settings: AgentSettings,
    /// Envelope verification key; `None` skips verification.
    verification_key: Option<VerificationKey>,
    /// Policy engine; `None` allows every verified plan.
    policy: Option<Arc<dyn PolicyClient>>,
    /// Audit sink.
    audit: Arc<dyn AuditSink<AgentAuditEvent>>,
}

impl RolloutAgent {
    /// Creates an agent with no verification key, no policy client, and no audit.
    #[must_use]
    pub fn new(bus: Arc<dyn MessageBus>, settings: AgentSettings) -> Self {
        Self {
            bus,
            settings,
            verification_key: None,
            policy: None,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Sets the envelope verification key.
    #[must_use]
    pub fn with_verification_key(mut self, key: Option<VerificationKey>) -> Self {
        self.verification_key = key;
        self
    }

    /// Sets the policy client.
    #[must_use]
    pub fn with_policy_client(mut self, policy: Option<Arc<dyn PolicyClient>>) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink<AgentAuditEvent>>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the agent settings.
    #[must_use]
    pub const fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Subscribes to the inbound subject and spawns the processing loop.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Subscribe`] when the subscription fails.
    pub async fn start(
        self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<RunSummary>, AgentError> {
        let subject = self.settings.inbound_subject.clone();
        let subscription = match self.bus.subscribe(&subject).await {
            Ok(subscription) => subscription,
            Err(source) => {
                self.audit.record(
                    &AgentAuditEvent::new("subscribe_failed", AuditLevel::Error)
                        .with_subject(&subject)
                        .with_detail(source.to_string()),
                );
                return Err(AgentError::Subscribe {
                    subject,
                    source,
                });
            }
        };
        Ok(tokio::spawn(self.run(subscription, shutdown)))
    }

    /// Processes messages until shutdown is signalled or the subscription ends.
    pub async fn run(
        self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        self.audit.record(
            &AgentAuditEvent::new("agent_started", AuditLevel::Info)
                .with_subject(subscription.subject()),
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            let message = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                message = subscription.next() => message,
            };
            let Some(message) = message else {
                break;
            };
            summary.observe(&self.process_message(&message.payload).await);
        }
        self.audit.record(
            &AgentAuditEvent::new("agent_stopped", AuditLevel::Info)
                .with_subject(subscription.subject())
                .with_detail(summary.to_string()),
        );
        summary
    }

    /// Processes one inbound payload through every stage.
    pub async fn process_message(&self, payload: &[u8]) -> MessageOutcome {
        let envelope = match Envelope::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(err) => return self.malformed(None, err.to_string()),
        };
        if envelope.kind != self.settings.plan_marker {
            return MessageOutcome::Ignored;
        }
        if let Some(key) = &self.verification_key
            && let Err(err) = verify_with_key(&envelope, key)
        {
            let mut event = AgentAuditEvent::new("signature_rejected", AuditLevel::Warn)
                .with_subject(&self.settings.inbound_subject)
                .with_detail(err.to_string());
            if let Ok(plan) = envelope.plan() {
                event = event.with_plan(&plan.plan_id);
            }
            self.audit.record(&event);
            return MessageOutcome::Rejected(err.to_string());
        }
        let plan = match envelope.plan() {
            Ok(plan) => plan,
            Err(err) => return self.malformed(Some(&envelope.kind), err.to_string()),
        };
        let decision = decide(&plan, self.policy.as_deref()).await;
        let published = self.publish(&decision).await;
        MessageOutcome::Decided {
            decision,
            published,
        }
    }

    /// Publishes a decision, recording the result.
    async fn publish(&self, decision: &Decision) -> bool {
        let message = decision.to_message(&self.settings.markers);
        let result = match serde_json::to_vec(&message) {
            Ok(bytes) => self
                .bus
                .publish(&self.settings.outbound_subject, bytes)
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        let mut event = match &result {
            Ok(()) => AgentAuditEvent::new("decision_published", AuditLevel::Info)
                .with_detail(decision.reason.clone()),
            Err(err) => {
                AgentAuditEvent::new("publish_failed", AuditLevel::Error).with_detail(err.clone())
            }
        }
        .with_subject(&self.settings.outbound_subject)
        .with_plan(&decision.plan_id);
        event.outcome = Some(decision.outcome);
        self.audit.record(&event);
        result.is_ok()
    }

    /// Records a malformed message and returns its outcome.
    fn malformed(&self, kind: Option<&str>, detail: String) -> MessageOutcome {
        let detail = match kind {
            Some(kind) => format!("{kind}: {detail}"),
            None => detail,
        };
        self.audit.record(
            &AgentAuditEvent::new("message_malformed", AuditLevel::Warn)
                .with_subject(&self.settings.inbound_subject)
                .with_detail(detail.clone()),
        );
        MessageOutcome::Malformed(detail)
    }
}
