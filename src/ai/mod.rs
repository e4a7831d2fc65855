//! LLM collaborator used by the Merge node for structured field extraction
//! from article text. See `retry` (crate root) for the backoff policy this
//! shares with the search collaborator.

mod client;
pub mod json_extract;

pub use client::AIClient;
pub use json_extract::extract_json;
