//! Graph wiring: routes from the coordinator's decision to the next node,
//! runs the terminal nodes, and drives one incident through the full
//! Extract → Search → Validate → Merge → Coordinate loop.

use crate::ai::AIClient;
use crate::db::IncidentRepository;
use crate::search::SearchClient;
use crate::state::{EnrichmentState, PipelineStage};

use super::{coordinator, extract, merge, search, validate};

/// Route `next_stage` to a concrete stage. Any value outside the known
/// terminal/continuation set falls back to `Escalate` rather than
/// panicking or looping forever.
pub fn route_after_coordinator(state: &EnrichmentState) -> PipelineStage {
    match state.next_stage {
        Some(
            stage @ (PipelineStage::Search
            | PipelineStage::Validate
            | PipelineStage::Merge
            | PipelineStage::Complete
            | PipelineStage::Escalate),
        ) => stage,
        _ => PipelineStage::Escalate,
    }
}

fn complete_node(state: &mut EnrichmentState) {
    state.current_stage = PipelineStage::Complete;
    state.requires_human_review = false;
    state.output_file_path = Some(format!("{}.json", state.incident_id));
    state.reasoning_summary = Some(reasoning_summary(state));
}

fn escalate_node(state: &mut EnrichmentState) {
    state.current_stage = PipelineStage::Escalate;
    state.requires_human_review = true;
    state.output_file_path = Some(format!("{}.escalated.json", state.incident_id));
    state.reasoning_summary = Some(reasoning_summary(state));
}

fn reasoning_summary(state: &EnrichmentState) -> String {
    match state.escalation_reason {
        Some(reason) => format!(
            "incident {} routed to human review: {:?}",
            state.incident_id, reason
        ),
        None => format!(
            "incident {} enriched with {} field(s) from {} article(s)",
            state.incident_id,
            state.extracted_fields.len(),
            state.retrieved_articles.len()
        ),
    }
}

/// Drive one incident through the full pipeline: Extract, then
/// Search/Validate/Merge under the coordinator's gating, until the
/// traversal reaches `Complete` or `Escalate`. This is the crate's single
/// traversal entry point — fanning out across many incidents is left to
/// the caller (ordinary `tokio::spawn`/`join_all`), since traversals
/// never share state.
pub async fn run_enrichment(
    mut state: EnrichmentState,
    repo: &dyn IncidentRepository,
    search_client: &dyn SearchClient,
    llm_client: &AIClient,
) -> EnrichmentState {
    extract::run(&mut state, repo).await;
    coordinator::run(&mut state);

    loop {
        match route_after_coordinator(&state) {
            PipelineStage::Search => {
                search::run(&mut state, search_client).await;
                coordinator::run(&mut state);
            }
            PipelineStage::Validate => {
                validate::run(&mut state);
                coordinator::run(&mut state);
            }
            PipelineStage::Merge => {
                merge::run(&mut state, llm_client).await;
                coordinator::run(&mut state);
            }
            PipelineStage::Complete => {
                complete_node(&mut state);
                break;
            }
            PipelineStage::Escalate => {
                escalate_node(&mut state);
                break;
            }
            PipelineStage::Extract => unreachable!("coordinator never routes back to extract"),
        }
    }

    state
}
