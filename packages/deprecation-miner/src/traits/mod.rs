//! Trait seams of the pipeline.
//!
//! Production implementations talk to the network or a model; tests swap in
//! the deterministic doubles from [`crate::testing`].

pub mod extractor;
pub mod fetcher;
pub mod generator;
