//! Summary counts over classification results.

use std::fmt;

use serde::Serialize;

use crate::types::snippet::ClassificationResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub old_matched: usize,
    pub new_succeeded: usize,

    /// Old matched and new succeeded
    pub confirmed: usize,
}

impl VerificationSummary {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            summary.old_matched += usize::from(result.old_matched_expected);
            summary.new_succeeded += usize::from(result.new_succeeded());
            summary.confirmed += usize::from(result.confirmed());
            summary
        })
    }

    pub fn all_confirmed(&self) -> bool {
        self.confirmed == self.total
    }
}

impl fmt::Display for VerificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cases: {} old matched expectation, {} new succeeded, {} confirmed",
            self.total, self.old_matched, self.new_succeeded, self.confirmed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::snippet::{ExecutionOutcome, ExitStatus};

    fn result(old_matched_expected: bool, new_status: ExitStatus) -> ClassificationResult {
        let outcome = |exit_status| ExecutionOutcome {
            exit_status,
            captured_stdout: String::new(),
            captured_stderr: String::new(),
            duration_ms: 1,
            timed_out: false,
        };

        ClassificationResult {
            case_name: "case".into(),
            old_outcome: outcome(ExitStatus::Failed),
            new_outcome: outcome(new_status),
            old_matched_expected,
        }
    }

    #[test]
    fn test_counts() {
        let results = vec![
            result(true, ExitStatus::Ok),
            result(true, ExitStatus::Failed),
            result(false, ExitStatus::Ok),
        ];

        let summary = VerificationSummary::from_results(&results);

        assert_eq!(
            summary,
            VerificationSummary {
                total: 3,
                old_matched: 2,
                new_succeeded: 2,
                confirmed: 1,
            }
        );
        assert!(!summary.all_confirmed());
        assert_eq!(
            summary.to_string(),
            "3 cases: 2 old matched expectation, 2 new succeeded, 1 confirmed"
        );
    }

    #[test]
    fn test_empty_is_vacuously_confirmed() {
        assert!(VerificationSummary::from_results(&[]).all_confirmed());
    }
}
