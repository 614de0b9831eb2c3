//! Integration tests for the extraction pipeline.
//!
//! These exercise Aggregator over mock fetchers and extractors, plus the
//! real SchemaExtractor over a mock generator:
//! 1. Per-source failures are skipped
//! 2. Source order is preserved
//! 3. The artifact round-trips field for field

use deprecation_miner::{
    artifact::read_facts,
    testing::{fact_fixture, MockExtractor, MockFetcher, MockGenerator},
    Aggregator, DeprecationFact, RetryPolicy, SchemaExtractor, SourceStatus,
};
use llm_client::LlmError;
use std::time::Duration;

fn foo_bar_fact() -> DeprecationFact {
    DeprecationFact {
        name: "Removal of foo.bar()".into(),
        question: "How do I fetch the current value with foo.bar() style access?".into(),
        question_variant: "Which call returns the current value of a foo object?".into(),
        old_approach: "Use foo.bar()".into(),
        new_approach: "foo.baz(), which also handles missing values".into(),
        subject: "foo.bar()".into(),
        completion_prompt: "To fetch the current value of a foo object use ".into(),
    }
}

#[tokio::test]
async fn test_failed_fetch_skips_only_that_source() {
    let fetcher = MockFetcher::new()
        .with_page("https://one.example/notes", "notes one")
        .with_failure("https://two.example/notes", 503)
        .with_page("https://three.example/notes", "notes three");
    let extractor = MockExtractor::new()
        .with_facts("notes one", vec![fact_fixture("one.a()"), fact_fixture("one.b()")])
        .with_facts("notes three", vec![fact_fixture("three.a()")]);

    let sources = [
        "https://one.example/notes",
        "https://two.example/notes",
        "https://three.example/notes",
    ];
    let report = Aggregator::new(fetcher.clone(), extractor.clone())
        .run_with_report(&sources)
        .await;

    let names: Vec<_> = report.facts.iter().map(|f| f.subject.as_str()).collect();
    assert_eq!(names, vec!["one.a()", "one.b()", "three.a()"]);

    assert_eq!(fetcher.calls(), sources);
    assert_eq!(extractor.calls(), vec!["notes one", "notes three"]);

    assert_eq!(report.sources[0].status, SourceStatus::Extracted);
    assert_eq!(report.sources[0].fact_count, 2);
    assert!(matches!(report.sources[1].status, SourceStatus::FetchFailed(_)));
    assert_eq!(report.sources[2].fact_count, 1);
}

#[tokio::test]
async fn test_single_fact_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extracted_deprecations.json");

    let fact = foo_bar_fact();
    assert!(fact.question.contains(&fact.subject));

    let fetcher = MockFetcher::new().with_page(
        "https://foo.example/changelog",
        "foo.bar() has been removed. Use foo.baz() instead.",
    );
    let extractor = MockExtractor::new().with_facts(
        "foo.bar() has been removed. Use foo.baz() instead.",
        vec![fact.clone()],
    );

    let report = Aggregator::new(fetcher, extractor)
        .run_and_persist(&["https://foo.example/changelog"], &path)
        .await
        .unwrap();

    assert_eq!(report.facts, vec![fact.clone()]);
    assert_eq!(read_facts(&path).unwrap(), vec![fact]);
}

#[tokio::test]
async fn test_schema_extractor_in_pipeline() {
    let good = foo_bar_fact();
    let mut unanchored = fact_fixture("foo.qux()");
    unanchored.subject = "qux helper".into();

    let generator = MockGenerator::new()
        .with_error(LlmError::Network("connection reset".into()))
        .with_response(serde_json::to_string(&vec![good.clone(), unanchored]).unwrap())
        .with_response("this is not json");

    let extractor = SchemaExtractor::new(generator.clone())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    let fetcher = MockFetcher::new()
        .with_page("a", "release notes a")
        .with_page("b", "release notes b");

    let report = Aggregator::new(fetcher, extractor)
        .run_with_report(&["a", "b"])
        .await;

    // Source a: one retry, then the unanchored fact is dropped.
    assert_eq!(report.facts, vec![good]);
    assert_eq!(report.sources[0].status, SourceStatus::Extracted);
    assert!(matches!(
        report.sources[1].status,
        SourceStatus::ExtractionFailed(_)
    ));
    assert_eq!(generator.requests().len(), 3);

    for fact in &report.facts {
        assert!(fact.question.contains(&fact.subject));
    }
}

#[tokio::test]
async fn test_persistence_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "x").unwrap();

    let fetcher = MockFetcher::new().with_page("s", "text");
    let extractor = MockExtractor::new().with_facts("text", vec![fact_fixture("x()")]);

    let result = Aggregator::new(fetcher, extractor)
        .run_and_persist(&["s"], &blocker.join("facts.json"))
        .await;

    assert!(result.is_err());
}
