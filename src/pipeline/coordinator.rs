//! Coordinator: gates every transition between stages. Dispatches to a
//! stage-specific check that inspects the state a node just produced and
//! decides whether to proceed, retry, or escalate to human review.

use crate::state::{EnrichmentState, EscalationReason, PipelineStage, STRATEGY_ORDER};

const AVG_RELEVANCE_SCORE_THRESHOLD: f64 = 0.5;

fn check_extract_results(state: &mut EnrichmentState) {
    if matches!(&state.error_message, Some(msg) if msg.starts_with("Extract failed")) {
        state.escalation_reason = Some(EscalationReason::ExtractionError);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    } else if state.civilian_name.is_none() && state.officer_name.is_none() && state.incident_date.is_none() {
        state.escalation_reason = Some(EscalationReason::InsufficientSources);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    } else {
        state.next_stage = Some(PipelineStage::Search);
    }
}

fn retry_helper(state: &mut EnrichmentState) {
    let current_index = STRATEGY_ORDER
        .iter()
        .position(|s| *s == state.next_strategy)
        .expect("next_strategy is always one of STRATEGY_ORDER");
    let next_index = current_index + 1;

    if next_index >= STRATEGY_ORDER.len() {
        state.next_stage = Some(PipelineStage::Escalate);
        state.escalation_reason = Some(EscalationReason::MaxRetries);
        state.requires_human_review = true;
    } else {
        state.retry_count += 1;
        state.next_strategy = STRATEGY_ORDER[next_index];
        state.next_stage = Some(PipelineStage::Search);
    }
}

fn check_search_results(state: &mut EnrichmentState) {
    if state.retry_count > state.max_retries {
        state.next_stage = Some(PipelineStage::Escalate);
        state.escalation_reason = Some(EscalationReason::MaxRetries);
        state.requires_human_review = true;
        return;
    }

    if matches!(&state.error_message, Some(msg) if msg.starts_with("Search failed")) {
        retry_helper(state);
        return;
    }

    let meets_threshold = state
        .search_attempts
        .last()
        .and_then(|attempt| attempt.avg_relevance_score)
        .map(|score| score >= AVG_RELEVANCE_SCORE_THRESHOLD)
        .unwrap_or(false);

    if meets_threshold {
        state.next_stage = Some(PipelineStage::Validate);
    } else {
        retry_helper(state);
    }
}

fn check_validate_results(state: &mut EnrichmentState) {
    if state.validation_results.iter().any(|r| r.passed) {
        state.next_stage = Some(PipelineStage::Merge);
    } else {
        state.escalation_reason = Some(EscalationReason::ValidationError);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    }
}

fn check_merge_results(state: &mut EnrichmentState) {
    if matches!(&state.error_message, Some(msg) if msg.starts_with("Merge failed")) {
        state.escalation_reason = Some(EscalationReason::MergeError);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    } else if !state.conflicting_fields.is_empty() {
        state.escalation_reason = Some(EscalationReason::Conflict);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    } else if state.extracted_fields.is_empty() {
        state.escalation_reason = Some(EscalationReason::InsufficientSources);
        state.requires_human_review = true;
        state.next_stage = Some(PipelineStage::Escalate);
    } else {
        state.next_stage = Some(PipelineStage::Complete);
    }
}

/// Inspect the state a node just produced and set `next_stage` (and,
/// when escalating, `escalation_reason`/`requires_human_review`). Leaves
/// `Complete`/`Escalate` states untouched — those are terminal.
pub fn run(state: &mut EnrichmentState) {
    match state.current_stage {
        PipelineStage::Extract => check_extract_results(state),
        PipelineStage::Search => check_search_results(state),
        PipelineStage::Validate => check_validate_results(state),
        PipelineStage::Merge => check_merge_results(state),
        PipelineStage::Complete | PipelineStage::Escalate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DatasetType, SearchAttempt, SearchStrategyType, ValidationResult};
    use chrono::{NaiveDate, Utc};

    fn state() -> EnrichmentState {
        EnrichmentState::new("142", DatasetType::CiviliansShot)
    }

    #[test]
    fn extract_escalates_when_all_identity_fields_missing() {
        let mut s = state();
        s.current_stage = PipelineStage::Extract;
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Escalate));
        assert_eq!(s.escalation_reason, Some(EscalationReason::InsufficientSources));
    }

    #[test]
    fn extract_proceeds_to_search_with_partial_data() {
        let mut s = state();
        s.current_stage = PipelineStage::Extract;
        s.incident_date = NaiveDate::from_ymd_opt(2018, 3, 15);
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Search));
    }

    #[test]
    fn search_retries_by_advancing_strategy() {
        let mut s = state();
        s.current_stage = PipelineStage::Search;
        s.next_strategy = SearchStrategyType::ExactMatch;
        s.search_attempts.push(SearchAttempt {
            query: "q".to_string(),
            strategy: SearchStrategyType::ExactMatch,
            num_results: 0,
            avg_relevance_score: None,
            timestamp: Utc::now(),
        });
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Search));
        assert_eq!(s.next_strategy, SearchStrategyType::TemporalExpanded);
        assert_eq!(s.retry_count, 1);
    }

    #[test]
    fn search_escalates_when_strategies_exhausted() {
        let mut s = state();
        s.current_stage = PipelineStage::Search;
        s.next_strategy = SearchStrategyType::EntityDropped;
        s.search_attempts.push(SearchAttempt {
            query: "q".to_string(),
            strategy: SearchStrategyType::EntityDropped,
            num_results: 0,
            avg_relevance_score: None,
            timestamp: Utc::now(),
        });
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Escalate));
        assert_eq!(s.escalation_reason, Some(EscalationReason::MaxRetries));
    }

    #[test]
    fn search_proceeds_when_relevance_meets_threshold() {
        let mut s = state();
        s.current_stage = PipelineStage::Search;
        s.search_attempts.push(SearchAttempt {
            query: "q".to_string(),
            strategy: SearchStrategyType::ExactMatch,
            num_results: 3,
            avg_relevance_score: Some(0.75),
            timestamp: Utc::now(),
        });
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Validate));
    }

    #[test]
    fn validate_escalates_when_nothing_passed() {
        let mut s = state();
        s.current_stage = PipelineStage::Validate;
        s.validation_results = vec![ValidationResult {
            article: crate::state::Article {
                url: "u".to_string(),
                title: "t".to_string(),
                snippet: "s".to_string(),
                content: None,
                source_name: None,
                published_date: None,
                relevance_score: 0.1,
            },
            date_match: false,
            location_match: false,
            victim_name_match: None,
            passed: false,
        }];
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Escalate));
        assert_eq!(s.escalation_reason, Some(EscalationReason::ValidationError));
    }

    #[test]
    fn merge_escalates_on_conflict_even_with_extracted_fields() {
        let mut s = state();
        s.current_stage = PipelineStage::Merge;
        s.extracted_fields.push(crate::state::FieldExtraction {
            field_name: crate::state::MediaFeatureField::Weapon,
            value: Some("handgun".to_string()),
            confidence: crate::state::ConfidenceLevel::High,
            sources: vec![],
            source_quotes: vec![],
            extraction_method: "llm".to_string(),
            llm_reasoning: None,
        });
        s.conflicting_fields.push(crate::state::MediaFeatureField::OfficerName);
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Escalate));
        assert_eq!(s.escalation_reason, Some(EscalationReason::Conflict));
    }

    #[test]
    fn merge_completes_when_fields_extracted_without_conflict() {
        let mut s = state();
        s.current_stage = PipelineStage::Merge;
        s.extracted_fields.push(crate::state::FieldExtraction {
            field_name: crate::state::MediaFeatureField::Weapon,
            value: Some("handgun".to_string()),
            confidence: crate::state::ConfidenceLevel::High,
            sources: vec![],
            source_quotes: vec![],
            extraction_method: "llm".to_string(),
            llm_reasoning: None,
        });
        run(&mut s);
        assert_eq!(s.next_stage, Some(PipelineStage::Complete));
    }
}
