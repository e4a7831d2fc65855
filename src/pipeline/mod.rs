//! The five-stage enrichment pipeline: Extract, Search, Validate, Merge,
//! and the Coordinator that gates every transition between them.

pub mod coordinator;
pub mod extract;
pub mod graph;
pub mod merge;
pub mod search;
pub mod validate;

pub use graph::run_enrichment;
