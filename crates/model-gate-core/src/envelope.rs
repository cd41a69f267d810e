// crates/model-gate-core/src/envelope.rs
// ============================================================================
// Module: Model Gate Envelopes
// Description: Signed bus envelopes, plan extraction, and Ed25519 verification.
// Purpose: Establish provenance of rollout plans before they are authorized.
// Dependencies: base64, ed25519-dalek, serde, serde_jcs, serde_json
// ============================================================================

//! ## Overview
//! Envelopes arrive over the message bus as JSON `{type, data, signature?,
//! key_id?}`. The signature is an Ed25519 signature over the RFC 8785
//! canonical JSON encoding of `data`, carried as standard base64.
//! Invariants:
//! - [`verify`] is pure: identical inputs always yield identical results.
//! - With no key configured, verification is skipped and passes.
//! - With a key configured, a missing, malformed, or wrong signature fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::identifiers::PlanId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Envelope parsing and verification failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Envelope bytes are not a valid envelope document.
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// Plan envelope has no `data.plan.id` string.
    #[error("plan envelope is missing data.plan.id")]
    MissingPlanId,
    /// Key material could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Envelope carries no signature.
    #[error("envelope signature missing")]
    MissingSignature,
    /// Signature could not be decoded.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
    /// Envelope key id does not match the configured key id.
    #[error("envelope key id {actual} does not match configured key id {expected}")]
    KeyIdMismatch {
        /// Configured key identifier.
        expected: String,
        /// Envelope key identifier.
        actual: String,
    },
    /// Payload could not be canonicalized.
    #[error("payload canonicalization failed: {0}")]
    Canonicalization(String),
    /// Signature does not match the payload.
    #[error("signature verification failed")]
    VerificationFailed,
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Signed message wrapper carried over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Type tag (for example the plan marker).
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque payload.
    #[serde(default)]
    pub data: Value,
    /// Base64 Ed25519 signature over canonical `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Optional identifier of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl Envelope {
    /// Parses an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] when the bytes are not an envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(|err| EnvelopeError::Malformed(err.to_string()))
    }

    /// Extracts the plan proposal carried in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingPlanId`] when `data.plan.id` is absent,
    /// empty, or not a string.
    pub fn plan(&self) -> Result<PlanProposal, EnvelopeError> {
        let id = self
            .data
            .get("plan")
            .and_then(|plan| plan.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or(EnvelopeError::MissingPlanId)?;
        Ok(PlanProposal {
            plan_id: PlanId::new(id),
            payload: self.data.clone(),
        })
    }
}

/// Rollout plan carried by a plan envelope.
///
/// # Invariants
/// - `payload` is the full envelope `data`, including `plan.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanProposal {
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Plan payload forwarded to the policy engine.
    pub payload: Value,
}

// ============================================================================
// SECTION: Keys
// ============================================================================

/// Configured Ed25519 public key with an optional identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    /// Decoded public key.
    key: VerifyingKey,
    /// Optional key identifier matched against envelope `key_id`.
    key_id: Option<String>,
}

impl VerificationKey {
    /// Wraps a decoded public key.
    #[must_use]
    pub const fn new(key: VerifyingKey, key_id: Option<String>) -> Self {
        Self {
            key,
            key_id,
        }
    }

    /// Decodes a base64 32-byte public key.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidKey`] when decoding fails.
    pub fn from_base64(encoded: &str, key_id: Option<String>) -> Result<Self, EnvelopeError> {
        let bytes = decode_key_bytes(encoded)?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|_| EnvelopeError::InvalidKey("invalid ed25519 public key".to_string()))?;
        Ok(Self::new(key, key_id))
    }

    /// Returns the configured key identifier.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Returns the public key encoded as base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        Base64.encode(self.key.as_bytes())
    }
}

/// Decodes a base64 32-byte Ed25519 signing key.
///
/// # Errors
///
/// Returns [`EnvelopeError::InvalidKey`] when decoding fails.
pub fn signing_key_from_base64(encoded: &str) -> Result<SigningKey, EnvelopeError> {
    let bytes = decode_key_bytes(encoded)?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Decodes base64 key material into exactly 32 bytes.
fn decode_key_bytes(encoded: &str) -> Result<[u8; 32], EnvelopeError> {
    let bytes = Base64
        .decode(encoded.trim())
        .map_err(|_| EnvelopeError::InvalidKey("invalid base64 key".to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::InvalidKey("ed25519 keys must be 32 bytes".to_string()))
}

// ============================================================================
// SECTION: Signing and Verification
// ============================================================================

/// Returns the canonical bytes signed for an envelope payload.
///
/// # Errors
///
/// Returns [`EnvelopeError::Canonicalization`] when the payload cannot be encoded.
pub fn canonical_payload_bytes(data: &Value) -> Result<Vec<u8>, EnvelopeError> {
    serde_jcs::to_vec(data).map_err(|err| EnvelopeError::Canonicalization(err.to_string()))
}

/// Signs an envelope payload, returning the base64 signature.
///
/// # Errors
///
/// Returns [`EnvelopeError::Canonicalization`] when the payload cannot be encoded.
pub fn sign_envelope_data(data: &Value, signing_key: &SigningKey) -> Result<String, EnvelopeError> {
    let message = canonical_payload_bytes(data)?;
    let signature = signing_key.sign(&message);
    Ok(Base64.encode(signature.to_bytes()))
}

/// Verifies an envelope against the configured key.
///
/// Returns true when no key is configured.
#[must_use]
pub fn verify(envelope: &Envelope, key: Option<&VerificationKey>) -> bool {
    key.is_none_or(|key| verify_with_key(envelope, key).is_ok())
}

/// Verifies an envelope against a key, reporting why verification failed.
///
/// # Errors
///
/// Returns [`EnvelopeError`] describing the first failed check.
pub fn verify_with_key(envelope: &Envelope, key: &VerificationKey) -> Result<(), EnvelopeError> {
    if let (Some(expected), Some(actual)) = (key.key_id.as_deref(), envelope.key_id.as_deref())
        && expected != actual
    {
        return Err(EnvelopeError::KeyIdMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    let encoded = envelope.signature.as_deref().ok_or(EnvelopeError::MissingSignature)?;
    let bytes = Base64
        .decode(encoded.trim())
        .map_err(|err| EnvelopeError::InvalidSignature(err.to_string()))?;
    let signature = Signature::from_slice(&bytes)
        .map_err(|_| EnvelopeError::InvalidSignature("signature must be 64 bytes".to_string()))?;
    let message = canonical_payload_bytes(&envelope.data)?;
    key.key.verify_strict(&message, &signature).map_err(|_| EnvelopeError::VerificationFailed)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
