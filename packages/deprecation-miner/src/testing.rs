//! Testing utilities including mock implementations.
//!
//! These let the pipeline be exercised without network access or model
//! calls. Every mock is cheap to clone and clones share state, so a test can
//! hand one copy to the pipeline and keep another for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use llm_client::LlmError;

use crate::error::{CallError, ExtractionError, FetchError, HttpError};
use crate::traits::{
    extractor::Extractor,
    fetcher::Fetcher,
    generator::{GenerationRequest, Generator},
};
use crate::types::fact::DeprecationFact;

/// A valid fact whose fields are derived from `name`.
///
/// `subject` is anchored in `question`.
pub fn fact_fixture(name: &str) -> DeprecationFact {
    DeprecationFact {
        name: format!("Removal of {}", name),
        question: format!("How do I get the result that {} gave me?", name),
        question_variant: format!("What should I call instead of {}?", name),
        old_approach: format!("Use {}", name),
        new_approach: format!("The replacement for {}", name),
        subject: name.to_string(),
        completion_prompt: format!("To get the result that {} gave me use ", name),
    }
}

#[derive(Debug, Clone)]
enum MockPage {
    Text(String),
    Status(u16),
}

/// A mock [`Fetcher`] serving canned text per source.
///
/// Unknown sources fail with a non-retryable 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, MockPage>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `source_id`.
    pub fn with_page(self, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(source_id.into(), MockPage::Text(text.into()));
        self
    }

    /// Fail `source_id` as if every attempt got HTTP `status`.
    pub fn with_failure(self, source_id: impl Into<String>, status: u16) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(source_id.into(), MockPage::Status(status));
        self
    }

    /// Sources fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, source_id: &str) -> Result<String, FetchError> {
        self.calls.write().unwrap().push(source_id.to_string());

        let page = self.pages.read().unwrap().get(source_id).cloned();
        let status_error = |status| HttpError::Status {
            status,
            url: source_id.to_string(),
        };

        match page {
            Some(MockPage::Text(text)) => Ok(text),
            Some(MockPage::Status(status)) => Err(FetchError {
                source_id: source_id.to_string(),
                cause: CallError::Exhausted {
                    attempts: crate::retry::DEFAULT_MAX_ATTEMPTS,
                    last: status_error(status),
                },
            }),
            None => Err(FetchError {
                source_id: source_id.to_string(),
                cause: CallError::Rejected(status_error(404)),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum MockExtraction {
    Facts(Vec<DeprecationFact>),
    Malformed,
}

/// A mock [`Extractor`] answering by exact input text.
///
/// Text with no canned answer yields no facts.
#[derive(Clone, Default)]
pub struct MockExtractor {
    answers: Arc<RwLock<HashMap<String, MockExtraction>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `facts` when asked to extract from `text`.
    pub fn with_facts(self, text: impl Into<String>, facts: Vec<DeprecationFact>) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(text.into(), MockExtraction::Facts(facts));
        self
    }

    /// Fail with malformed output when asked to extract from `text`.
    pub fn with_malformed(self, text: impl Into<String>) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(text.into(), MockExtraction::Malformed);
        self
    }

    /// Texts extracted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, raw_text: &str) -> Result<Vec<DeprecationFact>, ExtractionError> {
        self.calls.write().unwrap().push(raw_text.to_string());

        match self.answers.read().unwrap().get(raw_text).cloned() {
            Some(MockExtraction::Facts(facts)) => Ok(facts),
            Some(MockExtraction::Malformed) => {
                let err = serde_json::from_str::<Vec<DeprecationFact>>("not json").unwrap_err();
                Err(ExtractionError::MalformedOutput(err))
            }
            None => Ok(Vec::new()),
        }
    }
}

/// A mock [`Generator`] replaying a queue of responses.
///
/// Once the queue is drained every call fails with a non-retryable
/// configuration error.
#[derive(Clone, Default)]
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn with_response(self, body: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: LlmError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Config("no mock response queued".into())))
    }
}
