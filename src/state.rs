//! State model for the enrichment pipeline.
//!
//! `EnrichmentState` is the single value threaded through every node:
//! Extract populates baseline fields, Search/Validate/Merge append their
//! own findings, and the Coordinator updates the routing fields. No node
//! shares state with another incident's traversal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which TJI-style dataset an incident belongs to. Determines the Extract
/// node's field mapping: civilian-victim vs officer-victim schemas
/// name their severity column differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    CiviliansShot,
    OfficersShot,
}

/// Current position in the five-stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extract,
    Search,
    Validate,
    Merge,
    Complete,
    Escalate,
}

impl PipelineStage {
    /// The routing-key string the coordinator writes to `next_stage` and the
    /// graph router reads back. Centralized here so stage<->string mapping
    /// can't drift between the coordinator and the router.
    pub fn route_key(self) -> &'static str {
        match self {
            PipelineStage::Extract => "extract",
            PipelineStage::Search => "search",
            PipelineStage::Validate => "validate",
            PipelineStage::Merge => "merge",
            PipelineStage::Complete => "complete",
            PipelineStage::Escalate => "escalate",
        }
    }
}

/// Progressively broader search query templates, in escalation order.
/// The ordering is load-bearing: the coordinator's retry helper advances
/// strictly along this sequence and never skips or repeats a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategyType {
    ExactMatch,
    TemporalExpanded,
    EntityDropped,
}

pub const STRATEGY_ORDER: [SearchStrategyType; 3] = [
    SearchStrategyType::ExactMatch,
    SearchStrategyType::TemporalExpanded,
    SearchStrategyType::EntityDropped,
];

/// Confidence assigned to an admitted `FieldExtraction`. `Pending` is an
/// intermediate value produced per-article by Merge before reconciliation;
/// it must never survive into `extracted_fields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    None,
    Pending,
}

/// Why a traversal was routed to human review. `Composite`, `LowConfidence`,
/// `Overwrite`, and `SoftAnchor` are reserved for future policy and are
/// never raised by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    ExtractionError,
    ValidationError,
    MergeError,
    Conflict,
    Composite,
    LowConfidence,
    Overwrite,
    SoftAnchor,
    MaxRetries,
    InsufficientSources,
}

/// One of the nine media-derived attributes Merge attempts to extract from
/// each article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFeatureField {
    OfficerName,
    CivilianName,
    CivilianAge,
    CivilianRace,
    Weapon,
    LocationDetail,
    TimeOfDay,
    Outcome,
    Circumstance,
}

impl MediaFeatureField {
    pub const ALL: [MediaFeatureField; 9] = [
        MediaFeatureField::OfficerName,
        MediaFeatureField::CivilianName,
        MediaFeatureField::CivilianAge,
        MediaFeatureField::CivilianRace,
        MediaFeatureField::Weapon,
        MediaFeatureField::LocationDetail,
        MediaFeatureField::TimeOfDay,
        MediaFeatureField::Outcome,
        MediaFeatureField::Circumstance,
    ];

    /// Natural-language definition sent to the LLM extractor, one per field.
    pub fn definition(self) -> &'static str {
        match self {
            MediaFeatureField::OfficerName => {
                "Name of the police officer involved in the shooting. This person can be the shooter or the victim."
            }
            MediaFeatureField::CivilianName => {
                "Name of the civilian (non-officer) involved in the shooting. This person can be the shooter or the victim."
            }
            MediaFeatureField::CivilianAge => "Age of the civilian, as an integer.",
            MediaFeatureField::CivilianRace => "Race/ethnicity of the civilian.",
            MediaFeatureField::Weapon => {
                "Weapon involved in the incident, including type (e.g. handgun, rifle, knife, vehicle). Note which party possessed or used it if mentioned."
            }
            MediaFeatureField::LocationDetail => {
                "Detailed location information such as street, business, or landmark names."
            }
            MediaFeatureField::TimeOfDay => {
                "Time of day when the incident occurred, as described in the article."
            }
            MediaFeatureField::Outcome => "Fatal or non-fatal outcome of the victim.",
            MediaFeatureField::Circumstance => {
                "Any context or background regarding the incident such as the cause or complications."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaFeatureField::OfficerName => "officer_name",
            MediaFeatureField::CivilianName => "civilian_name",
            MediaFeatureField::CivilianAge => "civilian_age",
            MediaFeatureField::CivilianRace => "civilian_race",
            MediaFeatureField::Weapon => "weapon",
            MediaFeatureField::LocationDetail => "location_detail",
            MediaFeatureField::TimeOfDay => "time_of_day",
            MediaFeatureField::Outcome => "outcome",
            MediaFeatureField::Circumstance => "circumstance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "officer_name" => MediaFeatureField::OfficerName,
            "civilian_name" => MediaFeatureField::CivilianName,
            "civilian_age" => MediaFeatureField::CivilianAge,
            "civilian_race" => MediaFeatureField::CivilianRace,
            "weapon" => MediaFeatureField::Weapon,
            "location_detail" => MediaFeatureField::LocationDetail,
            "time_of_day" => MediaFeatureField::TimeOfDay,
            "outcome" => MediaFeatureField::Outcome,
            "circumstance" => MediaFeatureField::Circumstance,
            _ => return None,
        })
    }

    /// Fields that also exist as baseline DB values, subject to the
    /// reference cross-check in Merge.
    pub fn baseline_counterpart(self) -> Option<fn(&EnrichmentState) -> Option<&str>> {
        match self {
            MediaFeatureField::OfficerName => {
                Some(|s: &EnrichmentState| s.officer_name.as_deref())
            }
            MediaFeatureField::CivilianName => {
                Some(|s: &EnrichmentState| s.civilian_name.as_deref())
            }
            _ => None,
        }
    }
}

/// One article returned by a single web search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub content: Option<String>,
    pub source_name: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub relevance_score: f64,
}

/// A record of one Search node invocation. Append-only; `search_attempts`
/// is strictly ordered by time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAttempt {
    pub query: String,
    pub strategy: SearchStrategyType,
    pub num_results: usize,
    pub avg_relevance_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Tri-state match result: `Some(true)`/`Some(false)` when a name was
/// available to compare, `None` when the baseline name itself was null
/// (name match is never required to pass).
pub type TriMatch = Option<bool>;

/// Per-article anchor validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub article: Article,
    pub date_match: bool,
    pub location_match: bool,
    pub victim_name_match: TriMatch,
    pub passed: bool,
}

/// An admitted field value with provenance, ready for output or review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldExtraction {
    pub field_name: MediaFeatureField,
    pub value: Option<String>,
    pub confidence: ConfidenceLevel,
    pub sources: Vec<String>,
    pub source_quotes: Vec<String>,
    pub extraction_method: String,
    pub llm_reasoning: Option<String>,
}

impl FieldExtraction {
    pub fn pending(field_name: MediaFeatureField, value: Option<String>, source: String) -> Self {
        Self {
            field_name,
            value,
            confidence: ConfidenceLevel::Pending,
            sources: vec![source],
            source_quotes: Vec::new(),
            extraction_method: "llm".to_string(),
            llm_reasoning: None,
        }
    }
}

/// Root value flowing through the pipeline for one incident. Created by
/// the (external) batch orchestrator with `incident_id`/`dataset_type` set,
/// then mutated in place by each node in turn. Never shared across
/// incidents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentState {
    // Identity
    pub incident_id: String,
    pub dataset_type: DatasetType,

    // Baseline (Extract)
    pub officer_name: Option<String>,
    pub civilian_name: Option<String>,
    pub location: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub severity: String,

    // Search
    pub search_attempts: Vec<SearchAttempt>,
    pub retrieved_articles: Vec<Article>,

    // Validate
    pub validation_results: Vec<ValidationResult>,

    // Merge
    pub extracted_fields: Vec<FieldExtraction>,
    pub conflicting_fields: Vec<MediaFeatureField>,

    // Coordinator control
    pub retry_count: u32,
    pub max_retries: u32,
    pub next_strategy: SearchStrategyType,
    pub current_stage: PipelineStage,
    pub next_stage: Option<PipelineStage>,

    // Escalation
    pub escalation_reason: Option<EscalationReason>,
    pub requires_human_review: bool,

    // Output
    pub output_file_path: Option<String>,
    pub reasoning_summary: Option<String>,
    pub cost_usd: f64,
    pub error_message: Option<String>,
}

impl EnrichmentState {
    pub fn new(incident_id: impl Into<String>, dataset_type: DatasetType) -> Self {
        Self {
            incident_id: incident_id.into(),
            dataset_type,
            officer_name: None,
            civilian_name: None,
            location: None,
            incident_date: None,
            severity: "unknown".to_string(),
            search_attempts: Vec::new(),
            retrieved_articles: Vec::new(),
            validation_results: Vec::new(),
            extracted_fields: Vec::new(),
            conflicting_fields: Vec::new(),
            retry_count: 0,
            max_retries: 3,
            next_strategy: SearchStrategyType::ExactMatch,
            current_stage: PipelineStage::Extract,
            next_stage: None,
            escalation_reason: None,
            requires_human_review: false,
            output_file_path: None,
            reasoning_summary: None,
            cost_usd: 0.0,
            error_message: None,
        }
    }
}
