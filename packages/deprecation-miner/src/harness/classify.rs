//! Before/after behavior classification.

use tracing::info;

use super::SnippetHarness;
use crate::types::snippet::{ClassificationResult, ExecutionOutcome, SnippetCase};

/// Whether an old-code outcome shows `signature`.
///
/// A failed run must carry the signature on stderr; a run that exits
/// cleanly must print it on stdout (silent behavior changes are detected
/// through a marker the snippet prints). An empty signature never matches.
pub fn matches_expected(outcome: &ExecutionOutcome, signature: &str) -> bool {
    if signature.is_empty() {
        return false;
    }

    (outcome.is_failed() && outcome.captured_stderr.contains(signature))
        || (outcome.is_ok() && outcome.captured_stdout.contains(signature))
}

/// Runs each case's old and new code and judges the old run against the
/// expected signature. Classification is observational: it never fails.
pub struct BehaviorClassifier {
    harness: SnippetHarness,
}

impl BehaviorClassifier {
    pub fn new(harness: SnippetHarness) -> Self {
        Self { harness }
    }

    /// Classify one case. `old_code` runs to completion before `new_code`
    /// starts.
    pub async fn classify(&self, case: &SnippetCase) -> ClassificationResult {
        let old_outcome = self.harness.execute(&case.old_code).await;
        let new_outcome = self.harness.execute(&case.new_code).await;
        let old_matched_expected = matches_expected(&old_outcome, &case.expected_old_signature);

        info!(
            case = %case.case_name,
            old_status = ?old_outcome.exit_status,
            new_status = ?new_outcome.exit_status,
            old_matched_expected,
            "Classified case"
        );

        ClassificationResult {
            case_name: case.case_name.clone(),
            old_outcome,
            new_outcome,
            old_matched_expected,
        }
    }

    /// Classify cases one after another, in order.
    pub async fn classify_all(&self, cases: &[SnippetCase]) -> Vec<ClassificationResult> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.classify(case).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::HarnessConfig;
    use crate::types::snippet::ExitStatus;

    fn outcome(exit_status: ExitStatus, stdout: &str, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_status,
            captured_stdout: stdout.into(),
            captured_stderr: stderr.into(),
            duration_ms: 0,
            timed_out: false,
        }
    }

    #[test]
    fn test_failed_run_matches_on_stderr_only() {
        let failed = outcome(ExitStatus::Failed, "AttributeError", "Traceback\nValueError: x");

        assert!(matches_expected(&failed, "ValueError"));
        assert!(!matches_expected(&failed, "AttributeError"));
    }

    #[test]
    fn test_clean_run_matches_on_stdout_only() {
        let ok = outcome(ExitStatus::Ok, "LogicChange\n", "DeprecationWarning: old");

        assert!(matches_expected(&ok, "LogicChange"));
        assert!(!matches_expected(&ok, "DeprecationWarning"));
    }

    #[test]
    fn test_empty_signature_never_matches() {
        assert!(!matches_expected(&outcome(ExitStatus::Failed, "", "boom"), ""));
        assert!(!matches_expected(&outcome(ExitStatus::Ok, "ok", ""), ""));
    }

    #[tokio::test]
    async fn test_classify_all_keeps_order() {
        let harness = SnippetHarness::new(HarnessConfig::new("sh")).unwrap();
        let classifier = BehaviorClassifier::new(harness);
        let cases = vec![
            SnippetCase::new("first", "echo gone >&2; exit 1", "echo ok", "gone"),
            SnippetCase::new("second", "echo LogicChange", "echo ok", "LogicChange"),
            SnippetCase::new("third", "exit 0", "exit 1", "AttributeError"),
        ];

        let results = classifier.classify_all(&cases).await;

        let names: Vec<_> = results.iter().map(|r| r.case_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(results[0].confirmed());
        assert!(results[1].confirmed());
        assert!(!results[2].old_matched_expected);
        assert!(!results[2].new_succeeded());
    }
}
