//! HTTP fetcher.
//!
//! One GET per source, retried through [`RetryPolicy`]. HTML bodies are
//! reduced to readable text so the generation call sees prose, not markup.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, HttpError};
use crate::retry::RetryPolicy;
use crate::traits::fetcher::Fetcher;
use crate::types::config::FetchConfig;

lazy_static! {
    static ref SCRIPT: Regex = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    static ref STYLE: Regex = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref HEADING: Regex = Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"(?is)<li[^>]*>").unwrap();
    static ref BLOCK_END: Regex = Regex::new(r"(?i)</(p|div|pre|tr|ul|ol|li|section|table)>|<br\s*/?>").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]+>").unwrap();
    static ref TRAILING_SPACE: Regex = Regex::new(r"[ \t]+\n").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Fetcher that retrieves sources over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Create a fetcher with the given settings and retry policy.
    pub fn new(config: FetchConfig, retry: RetryPolicy) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// A single attempt.
    async fn fetch_once(&self, url: &Url) -> Result<String, HttpError> {
        debug!(url = %url, "HTTP fetch starting");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(false);

        let body = response.text().await?;

        if self.config.strip_html && (is_html || looks_like_html(&body)) {
            Ok(html_to_text(&body))
        } else {
            Ok(body)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source_id: &str) -> Result<String, FetchError> {
        let url = parse_source_url(source_id).map_err(|e| FetchError {
            source_id: source_id.to_string(),
            cause: crate::error::CallError::Rejected(e),
        })?;

        match self.retry.call(|| self.fetch_once(&url)).await {
            Ok(text) => {
                info!(url = %url, content_length = text.len(), "Source fetched");
                Ok(text)
            }
            Err(cause) => {
                warn!(url = %url, error = %cause, "Source fetch failed");
                Err(FetchError {
                    source_id: source_id.to_string(),
                    cause,
                })
            }
        }
    }
}

fn parse_source_url(source_id: &str) -> Result<Url, HttpError> {
    let invalid = || HttpError::InvalidUrl {
        url: source_id.to_string(),
    };

    let url = Url::parse(source_id.trim()).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<!DOCTYPE") || head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Convert an HTML document to plain text.
///
/// Scripts, styles and comments are dropped, headings become `#` lines,
/// list items become `- ` lines, and common entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");

    let text = HEADING.replace_all(&text, |caps: &regex::Captures| {
        let level = caps[1].parse::<usize>().unwrap_or(1);
        format!("\n{} {}\n", "#".repeat(level), &caps[2])
    });
    let text = LIST_ITEM.replace_all(&text, "\n- ");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");

    let text = TRAILING_SPACE.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");

    text.trim().to_string()
}
