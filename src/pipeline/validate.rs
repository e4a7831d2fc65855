//! Validate node: rule-based anchor checks (date, location, optional
//! victim name) against each retrieved article. Pure logic, no LLM calls.

use chrono::NaiveDate;

use crate::fuzzy::partial_ratio;
use crate::state::{EnrichmentState, PipelineStage, ValidationResult};

const FUZZY_THRESHOLD: u32 = 80;
const DATE_WINDOW_DAYS: i64 = 3;

pub fn check_date_match(article_date: Option<NaiveDate>, incident_date: Option<NaiveDate>) -> bool {
    match (article_date, incident_date) {
        (Some(a), Some(b)) => (a - b).num_days().abs() <= DATE_WINDOW_DAYS,
        _ => false,
    }
}

pub fn check_location_match(article_text: Option<&str>, location: Option<&str>) -> bool {
    match (article_text, location) {
        (Some(text), Some(loc)) => partial_ratio(text, loc) >= FUZZY_THRESHOLD,
        _ => false,
    }
}

pub fn check_name_match(article_text: Option<&str>, name: Option<&str>) -> bool {
    match (article_text, name) {
        (Some(text), Some(name)) => partial_ratio(text, name) >= FUZZY_THRESHOLD,
        _ => false,
    }
}

pub fn run(state: &mut EnrichmentState) {
    let mut results = Vec::with_capacity(state.retrieved_articles.len());

    for article in &state.retrieved_articles {
        let article_text = article.content.as_deref().or(Some(article.title.as_str()));

        let date_match = check_date_match(article.published_date, state.incident_date);
        let location_match = check_location_match(article_text, state.location.as_deref());
        let victim_name_match = state
            .civilian_name
            .as_deref()
            .map(|name| check_name_match(article_text, Some(name)));

        let passed = date_match && location_match;

        results.push(ValidationResult {
            article: article.clone(),
            date_match,
            location_match,
            victim_name_match,
            passed,
        });
    }

    state.validation_results = results;
    state.current_stage = PipelineStage::Validate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Article, DatasetType};

    fn article(content: &str, published: Option<NaiveDate>) -> Article {
        Article {
            url: "https://example.com".to_string(),
            title: "title".to_string(),
            snippet: content.chars().take(200).collect(),
            content: Some(content.to_string()),
            source_name: None,
            published_date: published,
            relevance_score: 0.9,
        }
    }

    #[test]
    fn date_within_three_days_matches() {
        let a = NaiveDate::from_ymd_opt(2018, 3, 15).unwrap();
        let b = NaiveDate::from_ymd_opt(2018, 3, 17).unwrap();
        assert!(check_date_match(Some(b), Some(a)));
    }

    #[test]
    fn date_four_days_apart_does_not_match() {
        let a = NaiveDate::from_ymd_opt(2018, 3, 15).unwrap();
        let b = NaiveDate::from_ymd_opt(2018, 3, 19).unwrap();
        assert!(!check_date_match(Some(b), Some(a)));
    }

    #[test]
    fn location_fuzzy_match_handles_suffix() {
        assert!(check_location_match(
            Some("A shooting in Dallas, TX"),
            Some("Dallas")
        ));
    }

    #[test]
    fn missing_civilian_name_yields_none_not_false() {
        let mut state = EnrichmentState::new("1", DatasetType::CiviliansShot);
        state.incident_date = NaiveDate::from_ymd_opt(2018, 3, 15);
        state.location = Some("Dallas".to_string());
        state.civilian_name = None;
        state.retrieved_articles = vec![article(
            "A shooting in Dallas, TX",
            NaiveDate::from_ymd_opt(2018, 3, 15),
        )];

        run(&mut state);

        assert_eq!(state.validation_results[0].victim_name_match, None);
        assert!(state.validation_results[0].passed);
    }

    #[test]
    fn passes_only_when_both_date_and_location_match() {
        let mut state = EnrichmentState::new("1", DatasetType::CiviliansShot);
        state.incident_date = NaiveDate::from_ymd_opt(2018, 3, 15);
        state.location = Some("Dallas".to_string());
        state.retrieved_articles = vec![article(
            "A shooting in Houston, TX",
            NaiveDate::from_ymd_opt(2018, 3, 15),
        )];

        run(&mut state);

        assert!(!state.validation_results[0].passed);
        assert!(!state.validation_results[0].location_match);
    }
}
