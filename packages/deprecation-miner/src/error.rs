//! Typed errors for the mining pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Failures are contained
//! at the smallest unit: [`FetchError`] and [`ExtractionError`] skip a single
//! source, only [`ArtifactError`] is fatal to a run.

use std::path::PathBuf;

use llm_client::LlmError;
use thiserror::Error;

/// Retry taxonomy for errors passed through [`crate::retry::RetryPolicy`].
///
/// The default says every failure is worth another attempt.
pub trait Transient {
    fn is_transient(&self) -> bool {
        true
    }
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        LlmError::is_transient(self)
    }
}

/// Outcome of a call that did not succeed.
#[derive(Debug, Error)]
pub enum CallError<E: std::error::Error + 'static> {
    /// Every attempt failed; carries the last underlying error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },

    /// The error was not retry-worthy; no further attempts were made.
    #[error("non-retryable failure: {0}")]
    Rejected(#[source] E),
}

impl<E: std::error::Error + 'static> CallError<E> {
    /// The underlying error of the final attempt.
    pub fn last_error(&self) -> &E {
        match self {
            CallError::Exhausted { last, .. } => last,
            CallError::Rejected(e) => e,
        }
    }
}

/// A single HTTP attempt that failed.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, timeout or body read failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Source identifier is not an http(s) URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl Transient for HttpError {
    fn is_transient(&self) -> bool {
        match self {
            HttpError::Transport(e) => !e.is_builder() && !e.is_redirect(),
            HttpError::Status { status, .. } => *status == 429 || *status >= 500,
            HttpError::InvalidUrl { .. } => false,
        }
    }
}

/// A source could not be retrieved. Never fatal to a run.
#[derive(Debug, Error)]
#[error("failed to fetch {source_id}: {cause}")]
pub struct FetchError {
    pub source_id: String,
    #[source]
    pub cause: CallError<HttpError>,
}

/// Extraction produced no usable facts for a source. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The generation call failed or was exhausted
    #[error("generation failed: {0}")]
    Generation(#[from] CallError<LlmError>),

    /// The response did not parse as an array of facts
    #[error("malformed structured output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

/// Reading or writing a JSON artifact failed. Fatal to the caller.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The snippet harness could not be constructed.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("interpreter '{program}' not found on PATH")]
    InterpreterNotFound {
        program: String,
        #[source]
        source: which::Error,
    },
}

/// An edit request that the editing collaborator would reject.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditRequestError {
    #[error("edit request has no edits")]
    Empty,

    #[error("prompts, ground_truth and target_new differ in length ({prompts}, {ground_truth}, {target_new})")]
    Unbalanced {
        prompts: usize,
        ground_truth: usize,
        target_new: usize,
    },

    #[error("{subject} subjects given for {prompts} prompts")]
    UnbalancedSubject { prompts: usize, subject: usize },

    #[error("locality probe '{name}' has {prompts} prompts but {ground_truth} ground truths")]
    UnbalancedLocality {
        name: String,
        prompts: usize,
        ground_truth: usize,
    },
}

/// Result type alias for artifact operations.
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_taxonomy() {
        let status = |code| HttpError::Status {
            status: code,
            url: "https://example.com".into(),
        };

        assert!(status(429).is_transient());
        assert!(status(502).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(400).is_transient());
        assert!(!HttpError::InvalidUrl { url: "ftp://x".into() }.is_transient());
    }

    #[test]
    fn test_call_error_exposes_last_error() {
        let err: CallError<HttpError> = CallError::Exhausted {
            attempts: 3,
            last: HttpError::Status { status: 503, url: "u".into() },
        };

        assert!(matches!(err.last_error(), HttpError::Status { status: 503, .. }));
        assert!(err.to_string().contains("3 attempts"));
    }
}
