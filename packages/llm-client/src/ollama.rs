//! Plain completions from a local Ollama server.

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::types::{CompletionOptions, OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions};

/// Ollama `/api/generate` client (non-streaming).
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
    model: String,
    base_url: String,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new("http://localhost:11434")
    }
}

impl OllamaClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            model: "codellama:7b-code".to_string(),
            base_url: base_url.into(),
        }
    }

    /// Set the model (default: codellama:7b-code).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion for `prompt`.
    pub async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
                stop: &options.stop,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, error_text));
        }

        let body: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        debug!(model = %self.model, response_len = body.response.len(), "Ollama completion");

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let options = CompletionOptions::default();
        let request = OllamaGenerateRequest {
            model: "codellama:7b-code",
            prompt: "def fib(n):",
            stream: false,
            options: OllamaOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
                stop: &options.stop,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1024);
        assert_eq!(json["options"]["stop"][1], "Answer:");
    }

    #[test]
    fn test_default_stop_sequences() {
        let options = CompletionOptions::default();
        assert!(options.stop.iter().any(|s| s == "\\end{code}"));
        assert_eq!(options.stop.len(), 4);
    }
}
