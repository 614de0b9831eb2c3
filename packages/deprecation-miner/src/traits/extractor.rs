//! Extractor trait for turning source text into facts.

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::types::fact::DeprecationFact;

/// Turns release-note text into deprecation facts.
///
/// An empty vector is a valid result meaning "nothing worth extracting".
/// The production implementation is [`crate::pipeline::SchemaExtractor`];
/// tests substitute [`crate::testing::MockExtractor`].
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> Result<Vec<DeprecationFact>, ExtractionError>;
}
