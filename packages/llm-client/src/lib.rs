//! Generation clients for deprecation mining.
//!
//! Thin REST clients with no domain logic:
//!
//! - [`GeminiClient`] and [`OpenAIClient`] produce JSON constrained by a schema
//! - [`OllamaClient`] produces plain completions from a local model
//!
//! Every client reports failures as [`LlmError`], which knows whether a retry
//! could help ([`LlmError::is_transient`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{to_gemini_schema, GeminiClient, StructuredOutput};
//!
//! let client = GeminiClient::new(api_key);
//! let schema = to_gemini_schema(&Vec::<Change>::strict_schema());
//! let body = client
//!     .generate_structured(&prompt, schema)
//!     .await?;
//! let changes: Vec<Change> = serde_json::from_str(&body)?;
//! ```

pub mod error;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod schema;
pub mod types;

pub use error::{LlmError, Result};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use schema::{to_gemini_schema, StructuredOutput};
pub use types::CompletionOptions;
