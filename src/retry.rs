//! Retry/backoff classification shared by the two HTTP collaborators that
//! call out over the network per traversal: the LLM extractor in
//! `ai::client` and the search client in `search`. Both hit the same class
//! of transient failure (rate limits, overloaded upstreams, timeouts), so
//! the classification and backoff math live here once.

use std::time::Duration;

/// Backoff schedule for one collaborator's retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Cap on the exponential growth.
    pub max_delay_ms: u64,
    /// Jitter range added on top of the capped delay.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter_ms: 250,
        }
    }
}

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorClass {
    Retryable,
    NonRetryable,
}

/// Classify an HTTP status code from the LLM or search API.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        429 => ErrorClass::Retryable,
        // Anthropic's overloaded signal.
        529 => ErrorClass::Retryable,
        500 | 502 | 503 | 504 => ErrorClass::Retryable,
        _ => ErrorClass::NonRetryable,
    }
}

/// Classify a transport-level error (connection failure, timeout) by its
/// message text, for clients that don't expose a status code on failure.
pub fn classify_error_message(msg: &str) -> ErrorClass {
    let lower = msg.to_lowercase();

    if lower.contains("rate limit")
        || lower.contains("overloaded")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("temporarily unavailable")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
    {
        return ErrorClass::Retryable;
    }

    if lower.contains("invalid api key")
        || lower.contains("authentication")
        || lower.contains("unauthorized")
        || lower.contains("permission denied")
        || lower.contains("invalid request")
    {
        return ErrorClass::NonRetryable;
    }

    ErrorClass::NonRetryable
}

/// Exponential backoff with jitter for the given attempt number (0-indexed).
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base = config.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    let capped = base.min(config.max_delay_ms);

    let jitter = if config.jitter_ms > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        now % config.jitter_ms
    } else {
        0
    };

    Duration::from_millis(capped.saturating_add(jitter))
}
