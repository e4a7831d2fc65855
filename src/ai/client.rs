//! LLM collaborator: the Merge node's only way of talking to an extractor
//! model. One call shape — a system prompt plus an article body, parsed
//! back as JSON — so the client exposes exactly that and nothing more.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::json_extract::extract_json;
use crate::retry::{calculate_delay, classify_error_message, classify_status, ErrorClass, RetryConfig};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AIClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AIClient {
    /// Build a client from an already-resolved API key and model, as
    /// loaded by `EnrichConfig::from_env`.
    pub fn from_parts(api_key: String, model: String) -> Result<Self, String> {
        if api_key.is_empty() {
            return Err("LLM API key not configured".to_string());
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Self { http, api_key, model })
    }

    /// Send `prompt` under `system` and parse the model's reply as `T`.
    /// Retries on rate limits and server errors; a parse failure or a
    /// non-retryable API error is returned to the caller as-is.
    pub async fn prompt_json_with_system<T: for<'de> Deserialize<'de>>(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<T, String> {
        let full_system = format!(
            "{}\n\nIMPORTANT: Respond ONLY with valid JSON. Do not include any text before or after the JSON object. Do not use markdown code blocks.",
            system
        );

        let content = self.complete(prompt, &full_system).await?;
        let json_str = extract_json(&content)?;

        serde_json::from_str(json_str).map_err(|e| {
            format!(
                "failed to parse extractor response: {}. Extracted: {}",
                e,
                &json_str[..json_str.len().min(500)]
            )
        })
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, String> {
        use log::{error, warn};
        use tokio::time::sleep;

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.to_string(),
            messages: vec![ApiMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let retry_config = RetryConfig::default();
        let mut last_error = String::new();

        for attempt in 0..retry_config.max_attempts {
            let response = self
                .http
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| format!("failed to read response: {}", e))?;
                        let parsed: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
                            format!(
                                "failed to parse response: {} - body: {}",
                                e,
                                &body[..body.len().min(500)]
                            )
                        })?;

                        return Ok(parsed
                            .content
                            .into_iter()
                            .filter(|c| c.content_type == "text")
                            .map(|c| c.text)
                            .collect::<Vec<_>>()
                            .join("\n"));
                    }

                    let body = resp.text().await.unwrap_or_default();
                    match classify_status(status.as_u16()) {
                        ErrorClass::Retryable if attempt < retry_config.max_attempts - 1 => {
                            let delay = calculate_delay(attempt, &retry_config);
                            warn!(
                                "extractor API returned {} (attempt {}/{}), retrying in {:?}",
                                status,
                                attempt + 1,
                                retry_config.max_attempts,
                                delay
                            );
                            last_error = format!("HTTP {}: {}", status, &body[..body.len().min(200)]);
                            sleep(delay).await;
                            continue;
                        }
                        _ => return Err(format!("extractor API error ({}): {}", status, body)),
                    }
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    match classify_error_message(&error_msg) {
                        ErrorClass::Retryable if attempt < retry_config.max_attempts - 1 => {
                            let delay = calculate_delay(attempt, &retry_config);
                            warn!(
                                "extractor request failed: {} (attempt {}/{}), retrying in {:?}",
                                e,
                                attempt + 1,
                                retry_config.max_attempts,
                                delay
                            );
                            last_error = error_msg;
                            sleep(delay).await;
                            continue;
                        }
                        _ => return Err(format!("extractor request failed: {}", e)),
                    }
                }
            }
        }

        error!(
            "max retries ({}) exceeded calling the extractor API",
            retry_config.max_attempts
        );
        Err(format!("max retries exceeded. last error: {}", last_error))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
