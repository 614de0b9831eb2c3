//! Error types for the generation clients.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Generation client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Network failures, rate limits (429) and server errors (5xx) are
    /// transient. Other client errors and malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Config(_) | LlmError::Parse(_) => false,
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        LlmError::Api {
            status: status.as_u16(),
            message: body,
        }
    }
}
