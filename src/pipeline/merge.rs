//! Merge node: extracts the nine media-feature fields from each article
//! with the LLM, reconciles values across articles, and cross-checks the
//! two name fields against the database baseline.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ai::AIClient;
use crate::fuzzy::ratio;
use crate::state::{
    Article, ConfidenceLevel, EnrichmentState, FieldExtraction, MediaFeatureField, PipelineStage,
};

const FUZZY_THRESHOLD: u32 = 80;

#[derive(Debug, Deserialize)]
struct RawExtraction {
    field_name: String,
    value: Option<String>,
    #[serde(default)]
    source_quotes: Vec<String>,
    #[serde(default)]
    llm_reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MergeExtractionResponse {
    extractions: Vec<RawExtraction>,
}

fn build_prompt(article: &Article) -> String {
    let mut prompt = String::from(
        "You are extracting structured information from a police shooting incident article.\nFor each of the following fields, extract the value from the article:\n",
    );
    for field in MediaFeatureField::ALL {
        prompt.push_str(&format!("- \"{}\": {}\n", field.as_str(), field.definition()));
    }
    prompt.push_str(&format!(
        "\nInstructions:\n- Use the exact field names shown above.\n- Quote the relevant sentence verbatim as \"source_quotes\".\n- Explain your rationale as \"llm_reasoning\".\n- If a field is not mentioned in the article, set value to null.\n\nArticle title: {}\nContent:\n---\n{}\n---\n",
        article.title,
        article.content.as_deref().unwrap_or(""),
    ));
    prompt
}

/// Per-article LLM extraction. Returns an empty map if the article has
/// no content or the LLM call fails — those articles simply contribute
/// nothing to the reconciliation step.
async fn extract_fields(article: &Article, client: &AIClient) -> HashMap<MediaFeatureField, FieldExtraction> {
    if article.content.is_none() {
        return HashMap::new();
    }

    let prompt = build_prompt(article);
    let system = "You extract structured fields from news articles about police shootings.";

    let response: Result<MergeExtractionResponse, String> =
        client.prompt_json_with_system(system, &prompt).await;

    let Ok(response) = response else {
        log::warn!("merge extraction failed for {}", article.url);
        return HashMap::new();
    };

    let mut out = HashMap::new();
    for raw in response.extractions {
        let Some(field) = MediaFeatureField::from_str(&raw.field_name) else {
            continue;
        };
        out.insert(
            field,
            FieldExtraction {
                field_name: field,
                value: raw.value,
                confidence: ConfidenceLevel::Pending,
                sources: vec![article.url.clone()],
                source_quotes: raw.source_quotes,
                extraction_method: "llm".to_string(),
                llm_reasoning: raw.llm_reasoning,
            },
        );
    }
    out
}

/// Cross-article consistency check for one field. `None` means the field
/// is a conflict (drop from `extracted_fields`, flag as conflicting).
fn check_articles_match(extractions: &[FieldExtraction]) -> Option<FieldExtraction> {
    let non_null: Vec<&FieldExtraction> = extractions.iter().filter(|e| e.value.is_some()).collect();

    if non_null.is_empty() {
        return None;
    }

    if non_null.len() == 1 {
        let mut winner = non_null[0].clone();
        winner.confidence = ConfidenceLevel::Medium;
        return Some(winner);
    }

    let values: Vec<&str> = non_null.iter().map(|e| e.value.as_deref().unwrap()).collect();
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        let mut winner = non_null[0].clone();
        winner.confidence = ConfidenceLevel::High;
        return Some(winner);
    }

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for v in &values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let most_common = *counts.iter().max_by_key(|(_, count)| **count).unwrap().0;

    let others: Vec<&str> = values.iter().copied().filter(|v| *v != most_common).collect();
    if others.iter().all(|other| ratio(most_common, other) >= FUZZY_THRESHOLD) {
        let mut winner = (*non_null
            .iter()
            .find(|e| e.value.as_deref() == Some(most_common))
            .unwrap())
        .clone();
        winner.confidence = ConfidenceLevel::Medium;
        Some(winner)
    } else {
        None
    }
}

/// Reference cross-check against the database baseline for name fields.
/// A null baseline accepts the extraction as-is. A fuzzy match
/// overwrites the value with the baseline's spelling. A fuzzy mismatch
/// still admits the extraction — it's flagged as conflicting too, per
/// the "admit and flag" policy: the field is never silently dropped just
/// because it disagrees with the baseline.
fn check_reference_match(extraction: &FieldExtraction, reference: Option<&str>) -> (bool, FieldExtraction) {
    match reference {
        None => (true, extraction.clone()),
        Some(reference) => {
            let value = extraction.value.as_deref().unwrap_or("");
            if ratio(reference, value) >= FUZZY_THRESHOLD {
                let mut matched = extraction.clone();
                matched.value = Some(reference.to_string());
                (true, matched)
            } else {
                (false, extraction.clone())
            }
        }
    }
}

pub async fn run(state: &mut EnrichmentState, client: &AIClient) {
    let mut extractions_by_field: HashMap<MediaFeatureField, Vec<FieldExtraction>> = HashMap::new();

    for article in state.retrieved_articles.clone() {
        let extracted = extract_fields(&article, client).await;
        for (field, extraction) in extracted {
            extractions_by_field.entry(field).or_default().push(extraction);
        }
    }

    state.extracted_fields.clear();
    state.conflicting_fields.clear();

    for field in MediaFeatureField::ALL {
        let Some(extractions) = extractions_by_field.get(&field) else {
            continue;
        };
        if extractions.is_empty() {
            continue;
        }

        match check_articles_match(extractions) {
            Some(converged) => {
                if let Some(baseline_fn) = field.baseline_counterpart() {
                    let reference = baseline_fn(state).map(|s| s.to_string());
                    let (matched, resolved) = check_reference_match(&converged, reference.as_deref());
                    if !matched {
                        state.conflicting_fields.push(field);
                    }
                    state.extracted_fields.push(resolved);
                } else {
                    state.extracted_fields.push(converged);
                }
            }
            None => {
                state.conflicting_fields.push(field);
            }
        }
    }

    state.current_stage = PipelineStage::Merge;
}
