//! Data types for the mining and verification pipeline.

pub mod config;
pub mod fact;
pub mod snippet;
