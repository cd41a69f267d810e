// crates/model-gate-cli/src/envelope_tools.rs
// ============================================================================
// Module: Envelope Tooling
// Description: Key generation and envelope signing for operators.
// Purpose: Produce envelopes the rollout agent will verify.
// Dependencies: ed25519-dalek, base64, model-gate-core
// ============================================================================

//! ## Overview
//! Keys are base64-encoded 32-byte Ed25519 secrets and public keys. Signing
//! covers the canonical JSON of the envelope `data`, matching verification.
//! Security posture: input files are size-limited before they are read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64;
use ed25519_dalek::SigningKey;
use model_gate_core::Envelope;
use model_gate_core::EnvelopeError;
use model_gate_core::VerificationKey;
use model_gate_core::sign_envelope_data;
use model_gate_core::signing_key_from_base64;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an envelope data or key file.
pub const MAX_INPUT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Envelope tooling failures.
#[derive(Debug, Error)]
pub enum EnvelopeToolError {
    /// Input file could not be read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// File path.
        path: String,
        /// Failure detail.
        message: String,
    },
    /// Input file exceeds the size limit.
    #[error("{path} is {size} bytes; limit is {limit}")]
    TooLarge {
        /// File path.
        path: String,
        /// Observed size.
        size: u64,
        /// Size limit.
        limit: usize,
    },
    /// Envelope data is not JSON.
    #[error("invalid envelope data: {0}")]
    InvalidData(String),
    /// Key decoding or signing failed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

// ============================================================================
// SECTION: Key Generation
// ============================================================================

/// Base64-encoded signing key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    /// Secret signing key.
    pub signing_key: String,
    /// Public verification key.
    pub public_key: String,
}

/// Generates a fresh Ed25519 key pair from the OS RNG.
#[must_use]
pub fn generate_keypair() -> KeyPair {
    let mut secret = [0_u8; 32];
    OsRng.fill_bytes(&mut secret);
    keypair_from_secret(&secret)
}

/// Encodes the key pair for a fixed secret.
#[must_use]
pub fn keypair_from_secret(secret: &[u8; 32]) -> KeyPair {
    let signing_key = SigningKey::from_bytes(secret);
    let public_key = VerificationKey::new(signing_key.verifying_key(), None);
    KeyPair {
        signing_key: Base64.encode(signing_key.to_bytes()),
        public_key: public_key.to_base64(),
    }
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Builds a signed envelope.
///
/// # Errors
///
/// Returns [`EnvelopeToolError::Envelope`] when the key is invalid or the
/// data cannot be canonicalized.
pub fn sign_envelope(
    kind: &str,
    data: Value,
    signing_key_b64: &str,
    key_id: Option<String>,
) -> Result<Envelope, EnvelopeToolError> {
    let signing_key = signing_key_from_base64(signing_key_b64.trim())?;
    let signature = sign_envelope_data(&data, &signing_key)?;
    Ok(Envelope {
        kind: kind.to_string(),
        data,
        signature: Some(signature),
        key_id,
    })
}

/// Reads a signing key file containing a base64 secret.
///
/// # Errors
///
/// Returns [`EnvelopeToolError`] when the file cannot be read.
pub fn read_signing_key(path: &Path) -> Result<String, EnvelopeToolError> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES)?;
    String::from_utf8(bytes)
        .map(|text| text.trim().to_string())
        .map_err(|_| EnvelopeToolError::Read {
            path: path.display().to_string(),
            message: "key file must be utf-8".to_string(),
        })
}

/// Reads envelope data from a JSON file.
///
/// # Errors
///
/// Returns [`EnvelopeToolError`] when the file cannot be read or parsed.
pub fn read_envelope_data(path: &Path) -> Result<Value, EnvelopeToolError> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES)?;
    serde_json::from_slice(&bytes).map_err(|err| EnvelopeToolError::InvalidData(err.to_string()))
}

/// Reads a file, rejecting content above `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, EnvelopeToolError> {
    let read_error = |err: std::io::Error| EnvelopeToolError::Read {
        path: path.display().to_string(),
        message: err.to_string(),
    };
    let too_large = |size: u64| EnvelopeToolError::TooLarge {
        path: path.display().to_string(),
        size,
        limit: max_bytes,
    };
    let file = File::open(path).map_err(read_error)?;
    let size = file.metadata().map_err(read_error)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(too_large(size));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(read_error)?;
    if bytes.len() > max_bytes {
        return Err(too_large(u64::try_from(bytes.len()).unwrap_or(u64::MAX)));
    }
    Ok(bytes)
}
