//! Centralized error handling for the enrichment pipeline.
//!
//! Provides `EnrichError` with one variant per external collaborator, plus
//! `From` impls so `?` propagates cleanly from database, search, and LLM
//! call sites.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for EnrichError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => EnrichError::NotFound("incident not found".to_string()),
            sqlx::Error::Database(db_err) => {
                EnrichError::Database(format!("database error: {}", db_err))
            }
            sqlx::Error::Io(io_err) => {
                EnrichError::Database(format!("database I/O error: {}", io_err))
            }
            sqlx::Error::Configuration(config_err) => {
                EnrichError::Database(format!("database configuration error: {}", config_err))
            }
            _ => EnrichError::Database(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for EnrichError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EnrichError::Search(format!("request timeout: {}", err))
        } else if err.is_connect() {
            EnrichError::Search(format!("connection failed: {}", err))
        } else if err.is_status() {
            if let Some(status) = err.status() {
                match status.as_u16() {
                    401 | 403 => EnrichError::Llm(format!("authentication failed: {}", err)),
                    404 => EnrichError::NotFound(format!("endpoint not found: {}", err)),
                    429 => EnrichError::Llm("rate limit exceeded".to_string()),
                    500..=599 => EnrichError::Llm(format!("upstream server error: {}", err)),
                    _ => EnrichError::Llm(format!("API error ({}): {}", status, err)),
                }
            } else {
                EnrichError::Llm(err.to_string())
            }
        } else if err.is_decode() {
            EnrichError::Validation(format!("failed to decode response: {}", err))
        } else {
            EnrichError::Search(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EnrichError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => {
                EnrichError::Validation(format!("JSON I/O error: {}", err))
            }
            serde_json::error::Category::Syntax => {
                EnrichError::Validation(format!("invalid JSON syntax: {}", err))
            }
            serde_json::error::Category::Data => {
                EnrichError::Validation(format!("invalid JSON data: {}", err))
            }
            serde_json::error::Category::Eof => {
                EnrichError::Validation(format!("unexpected end of JSON: {}", err))
            }
        }
    }
}

pub type EnrichResult<T> = Result<T, EnrichError>;
