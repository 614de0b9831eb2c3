//! Snippet cases and the outcomes of running them.

use serde::{Deserialize, Serialize};

/// A pre-authored before/after pair for one API change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetCase {
    #[serde(alias = "name")]
    pub case_name: String,

    /// Code using the deprecated behavior.
    pub old_code: String,

    /// Code using the replacement.
    pub new_code: String,

    /// Text expected in the old code's diagnostics: an error kind such as
    /// `AttributeError`, or a marker printed on stdout for silent logic
    /// changes.
    #[serde(alias = "expected_old_error")]
    pub expected_old_signature: String,
}

impl SnippetCase {
    pub fn new(
        case_name: impl Into<String>,
        old_code: impl Into<String>,
        new_code: impl Into<String>,
        expected_old_signature: impl Into<String>,
    ) -> Self {
        Self {
            case_name: case_name.into(),
            old_code: old_code.into(),
            new_code: new_code.into(),
            expected_old_signature: expected_old_signature.into(),
        }
    }
}

/// How a snippet run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Ok,
    Failed,
}

/// What one harness invocation observed. Fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub exit_status: ExitStatus,
    pub captured_stdout: String,
    pub captured_stderr: String,
    pub duration_ms: u64,
    pub timed_out: bool,
}

impl ExecutionOutcome {
    pub fn is_ok(&self) -> bool {
        self.exit_status == ExitStatus::Ok
    }

    pub fn is_failed(&self) -> bool {
        self.exit_status == ExitStatus::Failed
    }
}

/// Judgment for one [`SnippetCase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub case_name: String,
    pub old_outcome: ExecutionOutcome,
    pub new_outcome: ExecutionOutcome,

    /// The old code showed the expected signature: either it failed with the
    /// signature on stderr, or it ran and printed the signature on stdout.
    pub old_matched_expected: bool,
}

impl ClassificationResult {
    /// The replacement code ran cleanly.
    pub fn new_succeeded(&self) -> bool {
        self.new_outcome.is_ok()
    }

    /// Old behaved as expected and new ran cleanly.
    pub fn confirmed(&self) -> bool {
        self.old_matched_expected && self.new_succeeded()
    }
}
