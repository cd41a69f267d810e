// crates/model-gate-agent/src/bus.rs
// ============================================================================
// Module: Model Gate Message Bus
// Description: Publish/subscribe seam and the in-process bus implementation.
// Purpose: Decouple the rollout agent from a concrete broker.
// Dependencies: async-trait, tokio
// ============================================================================

//! ## Overview
//! [`MessageBus`] is the publish/subscribe seam used by the rollout agent and
//! the HTTP ingress. [`InMemoryBus`] fans each published message out to every
//! live subscription on the subject through bounded `tokio::sync::mpsc`
//! channels. [`Outbox`] keeps a subscription open on one subject so pull
//! consumers (the HTTP egress) can drain messages published while they were
//! away.
//! Invariants:
//! - Each subscription observes messages in publish order.
//! - Publishing to a subject with no live subscriber fails; nothing is
//!   silently dropped.
//! - After [`InMemoryBus::close`], subscribe and publish fail and open
//!   subscriptions drain then end.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::timeout;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-subscription channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Message delivered on a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Subject the message was published on.
    pub subject: String,
    /// Raw message payload.
    pub payload: Vec<u8>,
}

/// Ordered stream of messages for one subject.
#[derive(Debug)]
pub struct Subscription {
    /// Subscribed subject.
    subject: String,
    /// Receiving half of the delivery channel.
    receiver: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    /// Creates a subscription over a receiver.
    #[must_use]
    pub fn new(subject: impl Into<String>, receiver: mpsc::Receiver<BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            receiver,
        }
    }

    /// Returns the subscribed subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Waits for the next message; `None` once the bus side has closed.
    ///
    /// Cancel-safe: dropping the future never loses a message.
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Returns the next message if one is already queued.
    pub fn try_next(&mut self) -> Option<BusMessage> {
        self.receiver.try_recv().ok()
    }
}

/// Message bus failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Bus is closed.
    #[error("message bus closed")]
    Closed,
    /// Subject is empty or otherwise unusable.
    #[error("invalid subject: {0}")]
    InvalidSubject(String),
    /// No live subscription exists on the subject.
    #[error("no subscribers on {0}")]
    NoSubscribers(String),
    /// A subscriber cannot accept more messages.
    #[error("subscriber on {0} is full")]
    Full(String),
    /// Broker-specific failure.
    #[error("message bus error: {0}")]
    Backend(String),
}

/// Publish/subscribe message bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Opens an ordered subscription on `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the subscription cannot be established.
    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;

    /// Publishes `payload` on `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the message cannot be delivered.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;
}

// ============================================================================
// SECTION: In-Memory Bus
// ============================================================================

/// In-process message bus over bounded mpsc channels.
#[derive(Debug)]
pub struct InMemoryBus {
    /// Per-subscription channel capacity.
    capacity: usize,
    /// Subscriber senders keyed by subject; `None` once closed.
    subscribers: Mutex<Option<BTreeMap<String, Vec<mpsc::Sender<BusMessage>>>>>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl InMemoryBus {
    /// Creates a bus with the given per-subscription capacity (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(Some(BTreeMap::new())),
        }
    }

    /// Closes the bus, ending every open subscription after it drains.
    pub fn close(&self) {
        self.lock().take();
    }

    /// Returns the number of live subscriptions on `subject`.
    #[must_use]
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.lock().as_ref().and_then(|table| table.get(subject)).map_or(0, |senders| {
            senders.iter().filter(|sender| !sender.is_closed()).count()
        })
    }

    /// Locks the subscriber table.
    fn lock(&self) -> MutexGuard<'_, Option<BTreeMap<String, Vec<mpsc::Sender<BusMessage>>>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        validate_subject(subject)?;
        let (sender, receiver) = mpsc::channel(self.capacity);
        let mut guard = self.lock();
        let table = guard.as_mut().ok_or(BusError::Closed)?;
        table.entry(subject.to_string()).or_default().push(sender);
        Ok(Subscription::new(subject, receiver))
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        validate_subject(subject)?;
        let mut guard = self.lock();
        let table = guard.as_mut().ok_or(BusError::Closed)?;
        let no_subscribers = || BusError::NoSubscribers(subject.to_string());
        let senders = table.get_mut(subject).ok_or_else(no_subscribers)?;
        senders.retain(|sender| !sender.is_closed());
        if senders.is_empty() {
            return Err(no_subscribers());
        }
        let mut result = Ok(());
        for sender in senders.iter() {
            let message = BusMessage {
                subject: subject.to_string(),
                payload: payload.clone(),
            };
            match sender.try_send(message) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => result = Err(BusError::Full(subject.to_string())),
            }
        }
        result
    }
}

// ============================================================================
// SECTION: Outbox
// ============================================================================

/// Pull-side consumer that retains one subject's messages between reads.
///
/// # Invariants
/// - Retention is bounded by the bus channel capacity; once full, publishers
///   receive [`BusError::Full`].
/// - Concurrent drains are serialized and never observe the same message.
#[derive(Debug)]
pub struct Outbox {
    /// Retained subject.
    subject: String,
    /// Subscription holding undelivered messages.
    subscription: tokio::sync::Mutex<Subscription>,
}

impl Outbox {
    /// Subscribes to `subject` and starts retaining its messages.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the subscription cannot be established.
    pub async fn attach(bus: &dyn MessageBus, subject: &str) -> Result<Self, BusError> {
        let subscription = bus.subscribe(subject).await?;
        Ok(Self {
            subject: subject.to_string(),
            subscription: tokio::sync::Mutex::new(subscription),
        })
    }

    /// Returns the retained subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Takes up to `max` retained messages in publish order, waiting up to
    /// `wait` for the first one when none is queued.
    pub async fn drain(&self, max: usize, wait: Duration) -> Vec<BusMessage> {
        let mut messages = Vec::new();
        if max == 0 {
            return messages;
        }
        let mut subscription = self.subscription.lock().await;
        let first = match subscription.try_next() {
            Some(message) => Some(message),
            None if wait.is_zero() => None,
            None => timeout(wait, subscription.next()).await.ok().flatten(),
        };
        let Some(first) = first else {
            return messages;
        };
        messages.push(first);
        while messages.len() < max {
            let Some(message) = subscription.try_next() else {
                break;
            };
            messages.push(message);
        }
        messages
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects blank subjects.
fn validate_subject(subject: &str) -> Result<(), BusError> {
    if subject.trim().is_empty() {
        return Err(BusError::InvalidSubject("subject must be non-empty".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
