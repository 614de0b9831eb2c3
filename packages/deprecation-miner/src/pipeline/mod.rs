//! Extraction pipeline: schema-constrained extraction and per-source
//! aggregation.

pub mod aggregate;
pub mod extract;
pub mod prompts;

pub use aggregate::{Aggregator, RunReport, SourceReport, SourceStatus};
pub use extract::{fact_schema, parse_facts, screen_facts, SchemaExtractor};
