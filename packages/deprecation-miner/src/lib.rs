//! Deprecation Mining Library
//!
//! Mines library release notes for API deprecations and checks them against
//! real interpreter behavior.
//!
//! Two independent passes:
//!
//! - **Extraction**: an [`Aggregator`] fetches each source, asks a
//!   schema-constrained model for [`DeprecationFact`]s, and persists the
//!   combined list once at the end. A failing source is skipped, never fatal.
//! - **Verification**: a [`BehaviorClassifier`] runs each [`SnippetCase`]'s
//!   old and new code in a fresh interpreter process and records whether the
//!   old code showed the expected failure and the new code ran cleanly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use deprecation_miner::{Aggregator, HttpFetcher, SchemaExtractor};
//! use deprecation_miner::{FetchConfig, RetryPolicy, DEFAULT_SOURCES};
//!
//! let fetcher = HttpFetcher::new(FetchConfig::default(), RetryPolicy::default())?;
//! let extractor = SchemaExtractor::new(GeminiClient::new(api_key));
//! let report = Aggregator::new(fetcher, extractor)
//!     .run_and_persist(DEFAULT_SOURCES, Path::new("extracted_deprecations.json"))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`retry`] - Bounded exponential backoff shared by every outbound call
//! - [`traits`] - Seams (Fetcher, Extractor, Generator)
//! - [`fetchers`] - HTTP source fetching
//! - [`pipeline`] - Extraction and aggregation
//! - [`harness`] - Snippet execution and behavior classification
//! - [`edit`] - Edit requests for a knowledge-editing library
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod artifact;
pub mod config;
pub mod edit;
pub mod error;
pub mod fetchers;
pub mod harness;
pub mod pipeline;
pub mod retry;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use edit::{EditRequest, LocalityProbe};
pub use error::{
    ArtifactError, CallError, EditRequestError, ExtractionError, FetchError, HarnessError,
    HttpError, Transient,
};
pub use fetchers::{HttpFetcher, DEFAULT_SOURCES};
pub use harness::{BehaviorClassifier, SnippetHarness, VerificationSummary};
pub use pipeline::{Aggregator, RunReport, SchemaExtractor, SourceReport, SourceStatus};
pub use retry::RetryPolicy;
pub use traits::{
    extractor::Extractor,
    fetcher::Fetcher,
    generator::{GenerationRequest, Generator},
};
pub use types::{
    config::{AggregatorConfig, ExtractionConfig, FetchConfig, HarnessConfig, SubjectPolicy},
    fact::{DeprecationFact, FactViolation},
    snippet::{ClassificationResult, ExecutionOutcome, ExitStatus, SnippetCase},
};
