//! Error taxonomy for requests issued through [`crate::net::ApiClient`].
//!
//! ERROR HANDLING
//! ==============
//! Every failed call resolves to exactly one [`ApiError`] variant. The client
//! has already notified the user by the time the caller sees it, so callers
//! only decide local follow-up (keep a form open, re-enable a button).

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Stable machine-readable codes for errors surfaced to callers.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Failure of a single API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The envelope came back with a non-200 code.
    #[error("request rejected ({code}): {message}")]
    Application { code: i64, message: String },

    /// HTTP 401 or a token sentinel code. The session has been cleared.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// No usable response: network error, timeout, or an unreadable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The outgoing request could not be built.
    #[error("invalid request: {0}")]
    Config(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Application { .. } => "E_APPLICATION",
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Config(_) => "E_CONFIG",
        }
    }
}

impl ApiError {
    /// Envelope or HTTP code carried by the error, if any.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Application { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
