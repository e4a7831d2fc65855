//! Incident media-enrichment pipeline.
//!
//! Given a normalized police-shooting incident record, searches news
//! coverage, validates candidate articles against the incident's date and
//! location, and reconciles the media-derived fields those articles
//! describe against the database baseline. One `EnrichmentState`
//! traversal handles one incident; fanning out across many incidents is
//! the caller's responsibility.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod fuzzy;
pub mod pipeline;
pub mod retry;
pub mod search;
pub mod state;

pub use config::EnrichConfig;
pub use error::{EnrichError, EnrichResult};
pub use pipeline::run_enrichment;
pub use state::{DatasetType, EnrichmentState};
