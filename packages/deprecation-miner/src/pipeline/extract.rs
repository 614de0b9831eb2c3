//! Schema-constrained extraction of deprecation facts.
//!
//! One generation call per source: the instruction prologue, the raw text,
//! and the strict schema of `Vec<DeprecationFact>`. The call goes through the
//! shared [`RetryPolicy`]; the response is parsed as an array of facts and then
//! screened against the subject-anchor invariant.

use async_trait::async_trait;
use llm_client::StructuredOutput;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::pipeline::prompts::EXTRACT_DEPRECATIONS_PROMPT;
use crate::retry::RetryPolicy;
use crate::traits::extractor::Extractor;
use crate::traits::generator::{GenerationRequest, Generator};
use crate::types::config::{ExtractionConfig, SubjectPolicy};
use crate::types::fact::{DeprecationFact, FactViolation};

/// Strict output schema: an array of objects with exactly the seven fact
/// fields, all required.
pub fn fact_schema() -> serde_json::Value {
    Vec::<DeprecationFact>::strict_schema()
}

/// Parse a generation response body into facts.
///
/// A surrounding markdown code fence is tolerated; anything else that is not
/// an array of complete fact objects is an error.
pub fn parse_facts(body: &str) -> Result<Vec<DeprecationFact>, serde_json::Error> {
    let trimmed = body.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim())
}

/// Apply `policy` to facts that fail [`DeprecationFact::validate`].
///
/// Facts with empty fields are always dropped. Facts whose subject is not in
/// the question are dropped under [`SubjectPolicy::Reject`] and kept under
/// [`SubjectPolicy::Keep`]. Order is preserved.
pub fn screen_facts(facts: Vec<DeprecationFact>, policy: SubjectPolicy) -> Vec<DeprecationFact> {
    facts
        .into_iter()
        .filter(|fact| match fact.validate() {
            Ok(()) => true,
            Err(violation @ FactViolation::SubjectNotInQuestion { .. })
                if policy == SubjectPolicy::Keep =>
            {
                warn!(name = %fact.name, %violation, "Keeping fact with unanchored subject");
                true
            }
            Err(violation) => {
                warn!(name = %fact.name, %violation, "Dropping invalid fact");
                false
            }
        })
        .collect()
}

/// [`Extractor`] backed by a schema-constrained [`Generator`].
pub struct SchemaExtractor<G> {
    generator: G,
    retry: RetryPolicy,
    config: ExtractionConfig,
}

impl<G: Generator> SchemaExtractor<G> {
    /// Create an extractor with the default retry policy and config.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            retry: RetryPolicy::default(),
            config: ExtractionConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// The generation request for one source's text.
    pub fn build_request(&self, raw_text: &str) -> GenerationRequest {
        GenerationRequest {
            instructions: EXTRACT_DEPRECATIONS_PROMPT.to_string(),
            content: raw_text.to_string(),
            output_schema: fact_schema(),
        }
    }
}

#[async_trait]
impl<G: Generator> Extractor for SchemaExtractor<G> {
    async fn extract(&self, raw_text: &str) -> Result<Vec<DeprecationFact>, ExtractionError> {
        if raw_text.trim().is_empty() {
            debug!("Empty source text, nothing to extract");
            return Ok(Vec::new());
        }

        let request = self.build_request(raw_text);
        let body = self
            .retry
            .call(|| self.generator.generate(&request))
            .await?;

        let parsed = parse_facts(&body).map_err(|e| {
            warn!(error = %e, body_len = body.len(), "Generation output did not match the fact schema");
            ExtractionError::MalformedOutput(e)
        })?;

        let parsed_count = parsed.len();
        let facts = screen_facts(parsed, self.config.subject_policy);

        info!(
            parsed = parsed_count,
            kept = facts.len(),
            "Extracted deprecation facts"
        );

        Ok(facts)
    }
}
