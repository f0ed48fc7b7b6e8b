//! Shared response envelope model for the console backend.
//!
//! Every backend endpoint answers with the same `{code, message, data}`
//! wrapper. This crate owns that shape and the code table so the client
//! library and the CLI classify responses identically. Payloads stay
//! flexible (`serde_json::Value`); typed decoding happens at the call site.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only envelope code that means success.
pub const SUCCESS_CODE: i64 = 200;

/// Token expired.
pub const TOKEN_EXPIRED: i64 = 11003;
/// Token no longer valid (revoked or superseded).
pub const TOKEN_INVALIDATED: i64 = 11004;
/// Token malformed or unknown.
pub const TOKEN_INVALID: i64 = 11005;

/// Application codes that mean the bearer token must be discarded.
pub const TOKEN_SENTINEL_CODES: [i64; 3] = [TOKEN_EXPIRED, TOKEN_INVALIDATED, TOKEN_INVALID];

/// Error returned by [`decode_envelope`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The body was empty.
    #[error("empty response body")]
    Empty,
    /// The body is not JSON or lacks the required `code` field.
    #[error("malformed response envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// How a decoded envelope should be treated by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStatus {
    /// `code == 200`.
    Success,
    /// One of [`TOKEN_SENTINEL_CODES`].
    TokenRejected,
    /// Any other code.
    Failure,
}

/// The uniform response wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Application status code. Independent of the HTTP status.
    pub code: i64,
    /// Human-readable message; backends send `null` or omit it on success.
    #[serde(default)]
    pub message: Option<String>,
    /// Endpoint payload.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Build a success envelope carrying `data`.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self { code: SUCCESS_CODE, message: Some("success".to_owned()), data }
    }

    /// Build a failure envelope with no payload.
    #[must_use]
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: Some(message.into()), data: Value::Null }
    }

    /// Classify this envelope's code.
    #[must_use]
    pub fn status(&self) -> EnvelopeStatus {
        if self.code == SUCCESS_CODE {
            EnvelopeStatus::Success
        } else if is_token_sentinel(self.code) {
            EnvelopeStatus::TokenRejected
        } else {
            EnvelopeStatus::Failure
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == EnvelopeStatus::Success
    }

    /// The message if it carries any text.
    #[must_use]
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    /// The message, or `fallback` when absent or blank.
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message_text().unwrap_or(fallback)
    }

    /// Consume the envelope and return its payload.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Whether `code` is one of the token-invalid sentinels.
#[must_use]
pub fn is_token_sentinel(code: i64) -> bool {
    TOKEN_SENTINEL_CODES.contains(&code)
}

/// Decode a response body into an envelope.
///
/// # Errors
///
/// Returns [`EnvelopeError::Empty`] for an empty or whitespace-only body and
/// [`EnvelopeError::Malformed`] when the body is not an object with an
/// integer `code`.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(EnvelopeError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode an envelope as JSON bytes.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    // Serializing a struct of String/i64/Value into a Vec cannot fail.
    serde_json::to_vec(envelope).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
