// crates/model-gate-gateway/src/request.rs
// ============================================================================
// Module: Model Gate Completion Requests
// Description: Parsing and token estimation for inbound completion requests.
// Purpose: Extract routing inputs while preserving the caller's payload.
// Dependencies: model-gate-core, serde_json
// ============================================================================

//! ## Overview
//! A completion request is a JSON object with a `model` string, either a
//! `prompt` string or a `messages` array, and an optional `max_tokens`. All
//! other fields pass through to the upstream untouched. Input tokens are
//! estimated as one token per four characters of prompt text, rounded up.

// ============================================================================
// SECTION: Imports
// ============================================================================

use model_gate_core::ModelName;
use model_gate_core::Route;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Completion request validation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Body is not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(String),
    /// Body is not a JSON object.
    #[error("request body must be a json object")]
    NotAnObject,
    /// `model` is absent, blank, or not a string.
    #[error("model must be a non-empty string")]
    MissingModel,
    /// `max_tokens` is not a non-negative 32-bit integer.
    #[error("max_tokens must be a non-negative integer")]
    InvalidMaxTokens,
    /// Neither `prompt` nor `messages` is present.
    #[error("request must include prompt or messages")]
    MissingContent,
}

// ============================================================================
// SECTION: Completion Request
// ============================================================================

/// Validated completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Requested model name.
    model: ModelName,
    /// Requested output token ceiling.
    max_tokens: Option<u32>,
    /// Full request body.
    body: Map<String, Value>,
}

impl CompletionRequest {
    /// Parses a request from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the body is not a valid request.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| RequestError::InvalidJson(err.to_string()))?;
        Self::from_value(value)
    }

    /// Validates a JSON value as a request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the value is not a valid request.
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        let Value::Object(body) = value else {
            return Err(RequestError::NotAnObject);
        };
        let model = body
            .get("model")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(ModelName::new)
            .ok_or(RequestError::MissingModel)?;
        let max_tokens = match body.get("max_tokens") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|tokens| u32::try_from(tokens).ok())
                    .ok_or(RequestError::InvalidMaxTokens)?,
            ),
        };
        let has_prompt = body.get("prompt").is_some_and(Value::is_string);
        let has_messages = body.get("messages").is_some_and(Value::is_array);
        if !has_prompt && !has_messages {
            return Err(RequestError::MissingContent);
        }
        Ok(Self {
            model,
            max_tokens,
            body,
        })
    }

    /// Returns the requested model name.
    #[must_use]
    pub const fn model(&self) -> &ModelName {
        &self.model
    }

    /// Returns the requested output token ceiling.
    #[must_use]
    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Estimates input tokens from prompt and message text.
    #[must_use]
    pub fn estimate_input_tokens(&self) -> u32 {
        let mut chars = self.body.get("prompt").and_then(Value::as_str).map_or(0, count_chars);
        if let Some(messages) = self.body.get("messages").and_then(Value::as_array) {
            chars += messages.iter().map(message_chars).sum::<usize>();
        }
        u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
    }

    /// Returns the upstream payload with `model` rewritten to the route's model.
    #[must_use]
    pub fn upstream_body(&self, route: &Route) -> Value {
        let mut body = self.body.clone();
        body.insert("model".to_string(), Value::String(route.model.as_str().to_string()));
        Value::Object(body)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Counts Unicode scalar values.
fn count_chars(text: &str) -> usize {
    text.chars().count()
}

/// Counts text characters in a chat message.
///
/// `content` may be a string or an array of parts carrying `text`.
fn message_chars(message: &Value) -> usize {
    match message.get("content") {
        Some(Value::String(text)) => count_chars(text),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .map(count_chars)
            .sum(),
        _ => 0,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
