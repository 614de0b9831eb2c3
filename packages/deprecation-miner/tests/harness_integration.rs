//! Integration tests for the snippet harness and behavior classifier.
//!
//! Most tests drive `sh` so they run anywhere; the Python scenarios are
//! skipped when `python3` is not on PATH.

use std::time::Duration;

use deprecation_miner::{
    BehaviorClassifier, ExitStatus, HarnessConfig, SnippetCase, SnippetHarness,
    VerificationSummary,
};

fn shell() -> SnippetHarness {
    SnippetHarness::new(HarnessConfig::new("sh").with_timeout(Duration::from_secs(10))).unwrap()
}

fn python() -> Option<SnippetHarness> {
    if which::which("python3").is_err() {
        eprintln!("python3 not found, skipping");
        return None;
    }
    Some(SnippetHarness::new(HarnessConfig::default().with_timeout(Duration::from_secs(20))).unwrap())
}

#[tokio::test]
async fn test_python_value_error_case() {
    let Some(harness) = python() else { return };
    let classifier = BehaviorClassifier::new(harness);
    let case = SnippetCase::new("value error", "raise ValueError('x')", "print('ok')", "ValueError");

    let result = classifier.classify(&case).await;

    assert_eq!(result.old_outcome.exit_status, ExitStatus::Failed);
    assert!(result.old_outcome.captured_stderr.contains("ValueError"));
    assert!(result.old_matched_expected);
    assert_eq!(result.new_outcome.exit_status, ExitStatus::Ok);
    assert!(result.new_outcome.captured_stdout.contains("ok"));
}

#[tokio::test]
async fn test_python_state_does_not_leak_between_calls() {
    let Some(harness) = python() else { return };

    let first = harness.execute("import json\nleaked = 42\nprint(leaked)").await;
    let second = harness.execute("print(leaked)").await;

    assert!(first.is_ok());
    assert_eq!(first.captured_stdout.trim(), "42");
    assert!(second.is_failed());
    assert!(second.captured_stderr.contains("NameError"));
}

#[tokio::test]
async fn test_sentinel_only_in_its_own_outcome() {
    let harness = shell();

    let first = harness.execute("echo before >&2; exit 1").await;
    let second = harness.execute("echo SENTINEL-7f3a").await;

    assert!(first.is_failed());
    assert!(!first.captured_stdout.contains("SENTINEL-7f3a"));
    assert!(!first.captured_stderr.contains("SENTINEL-7f3a"));
    assert!(second.is_ok());
    assert_eq!(second.captured_stdout, "SENTINEL-7f3a\n");
    assert!(second.captured_stderr.is_empty());
}

#[tokio::test]
async fn test_identical_code_gives_identical_stdout() {
    let harness = shell();
    let code = "x=1; x=$((x+1)); echo $x";

    let first = harness.execute(code).await;
    let second = harness.execute(code).await;

    assert_eq!(first.captured_stdout, "2\n");
    assert_eq!(first.captured_stdout, second.captured_stdout);
    assert_eq!(first.exit_status, second.exit_status);
}

#[tokio::test]
async fn test_files_do_not_survive_between_calls() {
    let harness = shell();

    let write = harness.execute("echo data > state.txt && cat state.txt").await;
    let read = harness.execute("cat state.txt").await;

    assert_eq!(write.captured_stdout, "data\n");
    assert!(read.is_failed());
}

#[tokio::test]
async fn test_infinite_loop_times_out() {
    let harness =
        SnippetHarness::new(HarnessConfig::new("sh").with_timeout(Duration::from_millis(300))).unwrap();

    let started = std::time::Instant::now();
    let outcome = harness.execute("while true; do :; done").await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(outcome.is_failed());
    assert!(outcome.timed_out);
    assert!(outcome.captured_stderr.contains("TimeoutError"));

    // The harness is still usable afterwards.
    assert!(harness.execute("echo again").await.is_ok());
}

#[tokio::test]
async fn test_credentials_are_not_visible() {
    std::env::set_var("MINER_TEST_API_KEY", "hunter2");
    let outcome = shell().execute("echo \"[$MINER_TEST_API_KEY]\"").await;
    std::env::remove_var("MINER_TEST_API_KEY");

    assert_eq!(outcome.captured_stdout, "[]\n");
}

#[tokio::test]
async fn test_verification_summary_over_shell_cases() {
    let classifier = BehaviorClassifier::new(shell());
    let cases = vec![
        SnippetCase::new("removed", "echo 'AttributeError: gone' >&2; exit 1", "echo ok", "AttributeError"),
        SnippetCase::new("logic", "echo LogicChange", "echo ok", "LogicChange"),
        SnippetCase::new("unchanged", "echo fine", "echo ok", "AttributeError"),
    ];

    let results = classifier.classify_all(&cases).await;
    let summary = VerificationSummary::from_results(&results);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.old_matched, 2);
    assert_eq!(summary.new_succeeded, 3);
    assert_eq!(summary.confirmed, 2);
}

#[tokio::test]
async fn test_endless_output_is_capped() {
    let harness = SnippetHarness::new(
        HarnessConfig::new("sh")
            .with_timeout(Duration::from_secs(1))
            .with_max_output_bytes(64 * 1024),
    )
    .unwrap();

    let outcome = harness.execute("yes deprecated").await;

    assert!(outcome.timed_out);
    assert!(outcome.captured_stdout.starts_with("deprecated\ndeprecated\n"));
    assert!(outcome.captured_stdout.contains("[output truncated:"));
    assert!(outcome.captured_stdout.len() <= 64 * 1024 + 64);
}

#[tokio::test]
async fn test_timeout_keeps_partial_output() {
    let harness =
        SnippetHarness::new(HarnessConfig::new("sh").with_timeout(Duration::from_secs(1))).unwrap();

    let outcome = harness.execute("echo LogicChange; echo warned >&2; sleep 10").await;

    assert!(outcome.timed_out);
    assert!(outcome.is_failed());
    assert_eq!(outcome.captured_stdout, "LogicChange\n");
    assert!(outcome.captured_stderr.starts_with("warned\n"));
    assert!(outcome.captured_stderr.contains("TimeoutError"));
}

#[tokio::test]
async fn test_background_job_does_not_hold_snippet_open() {
    let harness = shell();

    let started = std::time::Instant::now();
    let outcome = harness.execute("sleep 30 & echo done").await;

    assert!(outcome.is_ok());
    assert!(!outcome.timed_out);
    assert_eq!(outcome.captured_stdout, "done\n");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_background_job_is_killed_with_snippet() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("late.txt");
    let code = format!("(sleep 1; touch '{}') & echo started", marker.display());

    let outcome = shell().execute(&code).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.captured_stdout, "started\n");
    assert!(!marker.exists());
}
