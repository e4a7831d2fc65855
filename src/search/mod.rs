//! Web search collaborator: turns a query string into a ranked list of
//! candidate articles. Matches the Tavily search API's JSON response shape
//! (`url`, `title`, `content`, `score`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EnrichError, EnrichResult};
use crate::retry::{calculate_delay, classify_status, ErrorClass, RetryConfig};

const SEARCH_API_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub score: f64,
    #[serde(default)]
    pub published_date: Option<String>,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: String, max_results: u32) -> EnrichResult<Vec<RawSearchResult>>;
}

pub struct TavilySearchClient {
    client: Client,
    api_key: String,
}

impl TavilySearchClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self { client, api_key }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<RawSearchResult>,
}

#[async_trait]
impl SearchClient for TavilySearchClient {
    async fn search(&self, query: String, max_results: u32) -> EnrichResult<Vec<RawSearchResult>> {
        use tokio::time::sleep;

        let retry_config = RetryConfig::default();
        let request = SearchRequest {
            api_key: &self.api_key,
            query: &query,
            max_results,
            search_depth: "advanced",
        };

        let mut last_error = String::new();

        for attempt in 0..retry_config.max_attempts {
            let response = self.client.post(SEARCH_API_URL).json(&request).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body: SearchResponse = resp.json().await?;
                        return Ok(body.results);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    match classify_status(status.as_u16()) {
                        ErrorClass::Retryable if attempt < retry_config.max_attempts - 1 => {
                            let delay = calculate_delay(attempt, &retry_config);
                            log::warn!(
                                "search API returned {} (attempt {}/{}), retrying in {:?}",
                                status,
                                attempt + 1,
                                retry_config.max_attempts,
                                delay
                            );
                            last_error = format!("HTTP {}: {}", status, &body[..body.len().min(200)]);
                            sleep(delay).await;
                            continue;
                        }
                        _ => {
                            return Err(EnrichError::Search(format!(
                                "search API error ({}): {}",
                                status, body
                            )));
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EnrichError::Search(format!(
            "max retries exceeded, last error: {}",
            last_error
        )))
    }
}
