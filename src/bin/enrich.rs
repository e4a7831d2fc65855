//! CLI entry point: enrich a single incident and print the result.
//!
//! Usage: enrich <incident_id> <civilians_shot|officers_shot>

use incident_enrichment::ai::AIClient;
use incident_enrichment::db::Database;
use incident_enrichment::search::TavilySearchClient;
use incident_enrichment::state::DatasetType;
use incident_enrichment::{run_enrichment, EnrichConfig, EnrichmentState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "cli-logging")]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let incident_id = args
        .next()
        .ok_or("usage: enrich <incident_id> <civilians_shot|officers_shot>")?;
    let dataset_arg = args
        .next()
        .ok_or("usage: enrich <incident_id> <civilians_shot|officers_shot>")?;

    let dataset_type = match dataset_arg.as_str() {
        "civilians_shot" => DatasetType::CiviliansShot,
        "officers_shot" => DatasetType::OfficersShot,
        other => return Err(format!("unknown dataset type: {}", other).into()),
    };

    let config = EnrichConfig::from_env()?;

    let repo = Database::new(&config.database_url).await?;
    let search_client = TavilySearchClient::new(config.search_api_key.clone());
    let llm_client = AIClient::from_parts(config.llm_api_key.clone(), config.llm_model.clone())?;

    let state = EnrichmentState::new(incident_id, dataset_type);
    let result = run_enrichment(state, &repo, &search_client, &llm_client).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.requires_human_review {
        std::process::exit(1);
    }

    Ok(())
}
