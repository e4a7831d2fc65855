//! Search node: builds a query from incident fields under the strategy
//! the Coordinator selected, and executes exactly one search call. Retry
//! decisions belong to the Coordinator, not this node.

use chrono::Utc;

use crate::search::SearchClient;
use crate::state::{Article, EnrichmentState, PipelineStage, SearchAttempt, SearchStrategyType};

const MAX_RESULTS: u32 = 5;

/// Construct the Tavily-shaped query string for a given strategy.
/// `ENTITY_DROPPED` also widens the date window to "Month YYYY", same as
/// `TEMPORAL_EXPANDED`, then additionally drops officer/civilian names.
pub fn build_search_query(state: &EnrichmentState, strategy: SearchStrategyType) -> String {
    let incident_date = state.incident_date;

    let (date_str, officer, civilian) = match strategy {
        SearchStrategyType::ExactMatch => (
            incident_date.map(|d| d.format("%Y-%m-%d").to_string()),
            state.officer_name.clone(),
            state.civilian_name.clone(),
        ),
        SearchStrategyType::TemporalExpanded => (
            incident_date.map(|d| d.format("%B %Y").to_string()),
            state.officer_name.clone(),
            state.civilian_name.clone(),
        ),
        SearchStrategyType::EntityDropped => (
            incident_date.map(|d| d.format("%B %Y").to_string()),
            None,
            None,
        ),
    };

    let mut terms: Vec<String> = Vec::new();
    if let Some(location) = &state.location {
        terms.push(location.clone());
    }
    terms.push("Texas police shooting".to_string());
    if let Some(date_str) = date_str {
        terms.push(date_str);
    }
    if let Some(officer) = officer {
        terms.push(officer);
    }
    if let Some(civilian) = civilian {
        terms.push(civilian);
    }
    if state.severity == "fatal" {
        terms.push(state.severity.clone());
    }

    terms.join(" ")
}

pub async fn run(state: &mut EnrichmentState, client: &dyn SearchClient) {
    let strategy = state.next_strategy;
    let query = build_search_query(state, strategy);

    let (articles, num_results, avg_relevance_score) =
        match client.search(query.clone(), MAX_RESULTS).await {
            Ok(results) => {
                let num_results = results.len();
                let avg = if num_results == 0 {
                    None
                } else {
                    Some(results.iter().map(|r| r.score).sum::<f64>() / num_results as f64)
                };
                let articles: Vec<Article> = results
                    .into_iter()
                    .map(|r| Article {
                        url: r.url,
                        title: r.title,
                        snippet: r.content.chars().take(500).collect(),
                        content: Some(r.content),
                        source_name: None,
                        published_date: r
                            .published_date
                            .and_then(|d| chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
                        relevance_score: r.score,
                    })
                    .collect();
                (articles, num_results, avg)
            }
            Err(e) => {
                state.error_message = Some(format!("Search failed: {}", e));
                (Vec::new(), 0, None)
            }
        };

    state.retrieved_articles = articles;
    state.search_attempts.push(SearchAttempt {
        query,
        strategy,
        num_results,
        avg_relevance_score,
        timestamp: Utc::now(),
    });
    state.current_stage = PipelineStage::Search;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnrichResult;
    use crate::search::RawSearchResult;
    use crate::state::DatasetType;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn houston_state() -> EnrichmentState {
        let mut state = EnrichmentState::new("142", DatasetType::CiviliansShot);
        state.location = Some("Houston".to_string());
        state.incident_date = NaiveDate::from_ymd_opt(2018, 3, 15);
        state.officer_name = Some("James Rodriguez".to_string());
        state.severity = "fatal".to_string();
        state
    }

    #[test]
    fn exact_match_uses_iso_date() {
        let state = houston_state();
        let query = build_search_query(&state, SearchStrategyType::ExactMatch);
        assert_eq!(
            query,
            "Houston Texas police shooting 2018-03-15 James Rodriguez fatal"
        );
    }

    #[test]
    fn temporal_expanded_uses_month_year() {
        let state = houston_state();
        let query = build_search_query(&state, SearchStrategyType::TemporalExpanded);
        assert_eq!(
            query,
            "Houston Texas police shooting March 2018 James Rodriguez fatal"
        );
    }

    #[test]
    fn entity_dropped_omits_names() {
        let state = houston_state();
        let query = build_search_query(&state, SearchStrategyType::EntityDropped);
        assert_eq!(query, "Houston Texas police shooting March 2018 fatal");
    }

    struct FakeSearchClient {
        results: Vec<RawSearchResult>,
    }

    #[async_trait]
    impl SearchClient for FakeSearchClient {
        async fn search(
            &self,
            _query: String,
            _max_results: u32,
        ) -> EnrichResult<Vec<RawSearchResult>> {
            Ok(self.results.clone())
        }
    }

    #[tokio::test]
    async fn records_search_attempt_with_average_relevance() {
        let client = FakeSearchClient {
            results: vec![
                RawSearchResult {
                    url: "https://a".to_string(),
                    title: "A".to_string(),
                    content: "content a".to_string(),
                    score: 0.6,
                    published_date: None,
                },
                RawSearchResult {
                    url: "https://b".to_string(),
                    title: "B".to_string(),
                    content: "content b".to_string(),
                    score: 0.8,
                    published_date: None,
                },
            ],
        };
        let mut state = houston_state();

        run(&mut state, &client).await;

        assert_eq!(state.retrieved_articles.len(), 2);
        let attempt = state.search_attempts.last().unwrap();
        assert_eq!(attempt.num_results, 2);
        assert_eq!(attempt.avg_relevance_score, Some(0.7));
        assert_eq!(state.current_stage, PipelineStage::Search);
    }
}
