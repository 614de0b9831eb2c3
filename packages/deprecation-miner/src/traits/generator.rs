//! Generator trait for schema-constrained generation calls.

use async_trait::async_trait;
use llm_client::LlmError;

/// One generation request: instructions, the text they apply to, and the
/// schema the output must conform to.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instructions: String,
    pub content: String,

    /// Strict JSON schema (see [`llm_client::StructuredOutput::strict_schema`]).
    /// Backends convert it to their own dialect.
    pub output_schema: serde_json::Value,
}

impl GenerationRequest {
    /// Instructions and content as a single prompt, for backends without
    /// separate system messages.
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.instructions.trim_end(), self.content)
    }
}

/// A model that answers a [`GenerationRequest`] with JSON text.
///
/// Implementations make exactly one attempt; retries belong to
/// [`crate::retry::RetryPolicy`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        (**self).generate(request).await
    }
}
