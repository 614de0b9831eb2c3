//! Fetcher implementations.
//!
//! - [`HttpFetcher`] - HTTP GET through the shared retry policy
//! - [`crate::testing::MockFetcher`] - canned responses for tests

pub mod http;

pub use http::{html_to_text, HttpFetcher};

/// Release notes mined when no sources are given.
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://numpy.org/doc/stable/release/2.3.0-notes.html",
    "https://numpy.org/doc/stable/release/2.2.0-notes.html",
    "https://numpy.org/doc/stable/release/2.1.0-notes.html",
    "https://numpy.org/doc/stable/release/2.0.0-notes.html",
    "https://pandas.pydata.org/docs/whatsnew/v2.3.0.html",
    "https://pandas.pydata.org/docs/whatsnew/v2.2.0.html",
    "https://github.com/pytorch/pytorch/releases",
];
