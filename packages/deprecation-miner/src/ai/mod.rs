//! [`Generator`] implementations backed by `llm-client`.
//!
//! ```rust,ignore
//! use deprecation_miner::pipeline::SchemaExtractor;
//! use llm_client::GeminiClient;
//!
//! let extractor = SchemaExtractor::new(GeminiClient::new(api_key));
//! ```

use async_trait::async_trait;
use llm_client::{to_gemini_schema, GeminiClient, LlmError, OpenAIClient};
use tracing::debug;

use crate::traits::generator::{GenerationRequest, Generator};

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        debug!(model = %self.model(), content_len = request.content.len(), "Gemini generate");
        let schema = to_gemini_schema(&request.output_schema);
        self.generate_structured(&request.prompt(), schema).await
    }
}

#[async_trait]
impl Generator for OpenAIClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        debug!(model = %self.model(), content_len = request.content.len(), "OpenAI generate");
        self.generate_structured(
            &request.instructions,
            &request.content,
            request.output_schema.clone(),
        )
        .await
    }
}
