use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use llm_client::{GeminiClient, OllamaClient, OpenAIClient};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::traits::generator::Generator;
use crate::types::config::{
    AggregatorConfig, ExtractionConfig, FetchConfig, HarnessConfig, SubjectPolicy,
};

/// Structured-output backend for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            other => Err(anyhow!("unknown provider '{}' (expected gemini|openai)", other)),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub source_delay: Duration,
    pub subject_policy: SubjectPolicy,
    pub strip_html: bool,
    pub request_timeout: Duration,
    pub snippet_interpreter: String,
    /// Interpreter arguments placed before the code; `None` keeps `-c`.
    pub snippet_args: Option<Vec<String>>,
    pub snippet_timeout: Duration,
    pub snippet_max_output_bytes: usize,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            provider: parse_var("MINER_PROVIDER", Provider::Gemini)?,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("MINER_MODEL").ok().filter(|m| !m.trim().is_empty()),
            max_attempts: parse_var("MINER_MAX_ATTEMPTS", crate::retry::DEFAULT_MAX_ATTEMPTS)?,
            backoff_base: Duration::from_millis(parse_var("MINER_BACKOFF_BASE_MS", 1000)?),
            source_delay: Duration::from_secs(parse_var("MINER_SOURCE_DELAY_SECS", 0)?),
            subject_policy: parse_var("MINER_SUBJECT_POLICY", SubjectPolicy::Reject)?,
            strip_html: parse_var("MINER_STRIP_HTML", true)?,
            request_timeout: Duration::from_secs(parse_var("MINER_REQUEST_TIMEOUT_SECS", 30)?),
            snippet_interpreter: env::var("SNIPPET_INTERPRETER")
                .unwrap_or_else(|_| "python3".to_string()),
            snippet_args: env::var("SNIPPET_ARGS").ok().map(|raw| split_args(&raw)),
            snippet_timeout: Duration::from_secs(parse_var("SNIPPET_TIMEOUT_SECS", 30)?),
            snippet_max_output_bytes: parse_var("SNIPPET_MAX_OUTPUT_BYTES", 1024 * 1024)?,
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| "codellama:7b-code".to_string()),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_base)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_strip_html(self.strip_html)
            .with_request_timeout(self.request_timeout)
    }

    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig::default().with_subject_policy(self.subject_policy)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            source_delay: self.source_delay,
        }
    }

    pub fn harness_config(&self) -> HarnessConfig {
        let config = HarnessConfig::new(self.snippet_interpreter.clone())
            .with_timeout(self.snippet_timeout)
            .with_max_output_bytes(self.snippet_max_output_bytes);
        match &self.snippet_args {
            Some(args) => config.with_args(args.iter().cloned()),
            None => config,
        }
    }

    /// The configured extraction backend. Fails if its API key is missing.
    pub fn generator(&self) -> Result<Box<dyn Generator>> {
        match self.provider {
            Provider::Gemini => {
                let key = self
                    .gemini_api_key
                    .clone()
                    .context("GEMINI_API_KEY must be set when MINER_PROVIDER=gemini")?;
                let mut client = GeminiClient::new(key);
                if let Some(model) = &self.model {
                    client = client.with_model(model.clone());
                }
                Ok(Box::new(client))
            }
            Provider::OpenAI => {
                let key = self
                    .openai_api_key
                    .clone()
                    .context("OPENAI_API_KEY must be set when MINER_PROVIDER=openai")?;
                let mut client = OpenAIClient::new(key);
                if let Some(model) = &self.model {
                    client = client.with_model(model.clone());
                }
                Ok(Box::new(client))
            }
        }
    }

    pub fn ollama_client(&self) -> OllamaClient {
        OllamaClient::new(self.ollama_url.clone()).with_model(self.ollama_model.clone())
    }
}

/// Parse `name` if set, otherwise use `default`.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} is invalid: {}", name, e)),
        _ => Ok(default),
    }
}

/// Whitespace-separated arguments. An empty value means no arguments.
fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn test_parse_var_default_and_error() {
        assert_eq!(parse_var("MINER_TEST_UNSET_VARIABLE", 7u32).unwrap(), 7);

        env::set_var("MINER_TEST_BAD_NUMBER", "seven");
        let err = parse_var("MINER_TEST_BAD_NUMBER", 7u32).unwrap_err();
        assert!(err.to_string().contains("MINER_TEST_BAD_NUMBER"));
        env::remove_var("MINER_TEST_BAD_NUMBER");
    }

    fn sample() -> Config {
        Config {
            provider: Provider::OpenAI,
            gemini_api_key: None,
            openai_api_key: None,
            model: None,
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            source_delay: Duration::ZERO,
            subject_policy: SubjectPolicy::Reject,
            strip_html: true,
            request_timeout: Duration::from_secs(30),
            snippet_interpreter: "python3".into(),
            snippet_args: None,
            snippet_timeout: Duration::from_secs(30),
            snippet_max_output_bytes: 1024 * 1024,
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "codellama:7b-code".into(),
        }
    }

    #[test]
    fn test_missing_key_is_reported() {
        let config = sample();

        let err = config.generator().err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args(" -I  -c "), vec!["-I", "-c"]);
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_harness_and_fetch_settings_flow_through() {
        let mut config = sample();
        config.snippet_interpreter = "node".into();
        config.snippet_args = Some(vec!["-e".into()]);
        config.snippet_max_output_bytes = 4096;
        config.request_timeout = Duration::from_secs(5);

        let harness = config.harness_config();
        assert_eq!(harness.program, "node");
        assert_eq!(harness.args, vec!["-e"]);
        assert_eq!(harness.max_output_bytes, 4096);
        assert_eq!(config.fetch_config().request_timeout, Duration::from_secs(5));

        config.snippet_args = None;
        assert_eq!(config.harness_config().args, vec!["-c"]);
    }
}
