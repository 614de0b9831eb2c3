//! Fetcher trait for retrieving source text.

use async_trait::async_trait;

use crate::error::FetchError;

/// Retrieves the raw text behind a source identifier (usually a URL).
///
/// A failure skips the source; it never aborts a run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source_id: &str) -> Result<String, FetchError>;
}
