//! Aggregation pipeline - fetch, extract, and accumulate facts per source.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::write_facts;
use crate::error::ArtifactResult;
use crate::traits::{extractor::Extractor, fetcher::Fetcher};
use crate::types::{config::AggregatorConfig, fact::DeprecationFact};

/// What happened to one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SourceStatus {
    Extracted,
    FetchFailed(String),
    ExtractionFailed(String),
}

/// Per-source line of a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub fact_count: usize,
}

/// Result of an aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// All facts, source order then batch order
    pub facts: Vec<DeprecationFact>,

    /// One entry per input source, in input order
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Sources that produced a batch (possibly empty).
    pub fn succeeded(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status == SourceStatus::Extracted)
            .count()
    }

    /// Sources skipped because of a fetch or extraction failure.
    pub fn failed(&self) -> usize {
        self.sources.len() - self.succeeded()
    }
}

/// Drives Fetcher then Extractor over an ordered list of sources.
///
/// Sources are processed one at a time. A failing source is logged and
/// skipped; nothing short of persistence aborts a run.
pub struct Aggregator<F, X> {
    fetcher: F,
    extractor: X,
    config: AggregatorConfig,
}

impl<F: Fetcher, X: Extractor> Aggregator<F, X> {
    pub fn new(fetcher: F, extractor: X) -> Self {
        Self {
            fetcher,
            extractor,
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Process every source and return the accumulated facts.
    ///
    /// An empty result is valid and means no source yielded anything.
    pub async fn run<S: AsRef<str>>(&self, sources: &[S]) -> Vec<DeprecationFact> {
        self.run_with_report(sources).await.facts
    }

    /// Process every source and report per-source outcomes.
    pub async fn run_with_report<S: AsRef<str>>(&self, sources: &[S]) -> RunReport {
        let started_at = Utc::now();
        let mut facts = Vec::new();
        let mut reports = Vec::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            let source_id = source.as_ref();

            if index > 0 && !self.config.source_delay.is_zero() {
                tokio::time::sleep(self.config.source_delay).await;
            }

            info!("Processing source {}/{}: {}", index + 1, sources.len(), source_id);

            let (status, batch) = self.process(source_id).await;
            reports.push(SourceReport {
                source_id: source_id.to_string(),
                status,
                fact_count: batch.len(),
            });
            facts.extend(batch);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            facts,
            sources: reports,
        };

        info!(
            sources = report.sources.len(),
            failed = report.failed(),
            facts = report.facts.len(),
            "Aggregation complete"
        );

        report
    }

    /// Run, then write the facts to `path` in a single write.
    ///
    /// Nothing is written when no facts were extracted. A write failure is
    /// the only error this returns.
    pub async fn run_and_persist<S: AsRef<str>>(
        &self,
        sources: &[S],
        path: &Path,
    ) -> ArtifactResult<RunReport> {
        let report = self.run_with_report(sources).await;

        if report.facts.is_empty() {
            warn!("No facts extracted, nothing to persist");
            return Ok(report);
        }

        write_facts(path, &report.facts)?;
        info!("Persisted {} facts to {}", report.facts.len(), path.display());

        Ok(report)
    }

    async fn process(&self, source_id: &str) -> (SourceStatus, Vec<DeprecationFact>) {
        let text = match self.fetcher.fetch(source_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", source_id, e);
                return (SourceStatus::FetchFailed(e.to_string()), Vec::new());
            }
        };

        match self.extractor.extract(&text).await {
            Ok(batch) => {
                info!("Extracted {} facts from {}", batch.len(), source_id);
                (SourceStatus::Extracted, batch)
            }
            Err(e) => {
                warn!("Extraction failed for {}: {}", source_id, e);
                (SourceStatus::ExtractionFailed(e.to_string()), Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fact_fixture, MockExtractor, MockFetcher};
    use std::time::Duration;

    #[tokio::test]
    async fn test_extraction_failure_skips_source() {
        let fetcher = MockFetcher::new()
            .with_page("s1", "notes 1")
            .with_page("s2", "notes 2");
        let extractor = MockExtractor::new()
            .with_malformed("notes 1")
            .with_facts("notes 2", vec![fact_fixture("b()")]);

        let report = Aggregator::new(fetcher, extractor)
            .run_with_report(&["s1", "s2"])
            .await;

        assert_eq!(report.facts, vec![fact_fixture("b()")]);
        assert!(matches!(report.sources[0].status, SourceStatus::ExtractionFailed(_)));
        assert_eq!(report.sources[0].fact_count, 0);
        assert_eq!(report.sources[1].status, SourceStatus::Extracted);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_batches_keep_internal_order() {
        let batch = vec![fact_fixture("a()"), fact_fixture("b()"), fact_fixture("c()")];
        let fetcher = MockFetcher::new().with_page("s", "notes");
        let extractor = MockExtractor::new().with_facts("notes", batch.clone());

        let facts = Aggregator::new(fetcher, extractor).run(&["s"]).await;
        assert_eq!(facts, batch);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_empty_not_error() {
        let fetcher = MockFetcher::new().with_failure("s1", 503);
        let extractor = MockExtractor::new();

        let facts = Aggregator::new(fetcher, extractor.clone())
            .run(&["s1", "s2"])
            .await;

        assert!(facts.is_empty());
        assert!(extractor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");

        let report = Aggregator::new(MockFetcher::new(), MockExtractor::new())
            .run_and_persist(&["missing"], &path)
            .await
            .unwrap();

        assert!(report.facts.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_delay_between_sources_only() {
        let fetcher = MockFetcher::new()
            .with_page("s1", "x")
            .with_page("s2", "x")
            .with_page("s3", "x");
        let aggregator = Aggregator::new(fetcher, MockExtractor::new()).with_config(AggregatorConfig {
            source_delay: Duration::from_secs(10),
        });

        let start = tokio::time::Instant::now();
        aggregator.run(&["s1", "s2", "s3"]).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(20), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(30), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_source_report_serialization() {
        let report = SourceReport {
            source_id: "s".into(),
            status: SourceStatus::FetchFailed("HTTP 404".into()),
            fact_count: 0,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "fetch_failed");
        assert_eq!(json["message"], "HTTP 404");
        assert_eq!(json["fact_count"], 0);
    }
}
