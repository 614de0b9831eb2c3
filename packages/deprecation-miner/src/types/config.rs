//! Configuration types for fetching, extraction, aggregation and the harness.

use std::str::FromStr;
use std::time::Duration;

/// What the extractor does with facts whose `subject` is not a substring of
/// their `question`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubjectPolicy {
    /// Drop the fact and log a warning.
    #[default]
    Reject,

    /// Keep the fact and log a warning.
    Keep,
}

impl FromStr for SubjectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(SubjectPolicy::Reject),
            "keep" => Ok(SubjectPolicy::Keep),
            other => Err(format!("unknown subject policy '{}' (expected reject|keep)", other)),
        }
    }
}

/// Configuration for the schema-constrained extractor.
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfig {
    pub subject_policy: SubjectPolicy,
}

impl ExtractionConfig {
    pub fn with_subject_policy(mut self, policy: SubjectPolicy) -> Self {
        self.subject_policy = policy;
        self
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,

    /// Bound on a single HTTP attempt.
    pub request_timeout: Duration,

    /// Reduce HTML bodies to readable text before extraction.
    pub strip_html: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("deprecation-miner/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            strip_html: true,
        }
    }
}

impl FetchConfig {
    pub fn with_strip_html(mut self, strip: bool) -> Self {
        self.strip_html = strip;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for the aggregator.
#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    /// Pause between consecutive sources (provider rate limits).
    pub source_delay: Duration,
}

/// Configuration for the snippet harness.
///
/// A snippet runs as `<program> <args...> <code>`.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub program: String,
    pub args: Vec<String>,

    /// Wall-clock bound on one snippet.
    pub timeout: Duration,

    /// Bytes kept per output stream; the rest is read and discarded.
    pub max_output_bytes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-c".to_string()],
            timeout: Duration::from_secs(30),
            max_output_bytes: 1024 * 1024,
        }
    }
}

impl HarnessConfig {
    /// Run snippets with `program -c <code>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }
}
