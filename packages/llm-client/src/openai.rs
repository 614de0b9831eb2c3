//! OpenAI chat-completions client with `json_schema` structured output.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::types::{ChatResponseRaw, StructuredRequest};

/// Property that carries an array result inside the object envelope
/// built by [`envelope`].
const ENVELOPE_KEY: &str = "items";

/// OpenAI REST client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Structured output with a strict JSON schema
    /// (see [`crate::StructuredOutput::strict_schema`]).
    ///
    /// OpenAI only accepts object roots, so array schemas travel inside an
    /// `{"items": [...]}` envelope that is removed again before returning.
    /// The returned text always matches `schema` itself.
    pub async fn generate_structured(
        &self,
        system: &str,
        user: &str,
        schema: Value,
    ) -> Result<String> {
        let start = std::time::Instant::now();
        let wrapped = is_array_schema(&schema);
        let schema = if wrapped { envelope(schema) } else { schema };

        let request = StructuredRequest::new(&self.model, system, user, schema);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(LlmError::from_status(status, error_text));
        }

        let chat_response: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No response from OpenAI".into()))?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI structured output"
        );

        if wrapped {
            unwrap_envelope(&content)
        } else {
            Ok(content)
        }
    }
}

fn is_array_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("array")
}

fn envelope(array_schema: Value) -> Value {
    json!({
        "type": "object",
        "properties": { "items": array_schema },
        "required": ["items"],
        "additionalProperties": false,
    })
}

fn unwrap_envelope(content: &str) -> Result<String> {
    let mut value: Value = serde_json::from_str(content)
        .map_err(|e| LlmError::Parse(format!("Invalid JSON from OpenAI: {}", e)))?;

    let inner = value
        .get_mut(ENVELOPE_KEY)
        .map(Value::take)
        .ok_or_else(|| LlmError::Parse(format!("Missing '{}' in OpenAI response", ENVELOPE_KEY)))?;

    serde_json::to_string(&inner).map_err(|e| LlmError::Parse(e.to_string()))
}
