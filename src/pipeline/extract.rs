//! Extract node: fetches the baseline incident record from the database
//! and populates state. Deterministic — no LLM calls.

use crate::db::IncidentRepository;
use crate::state::{EnrichmentState, PipelineStage};

pub async fn run(state: &mut EnrichmentState, repo: &dyn IncidentRepository) {
    let incident_id: i64 = match state.incident_id.parse() {
        Ok(id) => id,
        Err(e) => {
            state.error_message = Some(format!("Extract failed: invalid incident id: {}", e));
            state.current_stage = PipelineStage::Extract;
            return;
        }
    };

    match repo.fetch_incident(incident_id, state.dataset_type).await {
        Ok(record) => {
            state.officer_name = record.officer_name;
            state.civilian_name = record.civilian_name;
            state.incident_date = record.incident_date;
            state.location = record.location;
            state.severity = record.severity;
        }
        Err(e) => {
            state.error_message = Some(format!("Extract failed: {}", e));
        }
    }

    state.current_stage = PipelineStage::Extract;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::IncidentRecord;
    use crate::error::{EnrichError, EnrichResult};
    use crate::state::DatasetType;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FakeRepo {
        result: Result<IncidentRecord, String>,
    }

    #[async_trait]
    impl IncidentRepository for FakeRepo {
        async fn fetch_incident(
            &self,
            _incident_id: i64,
            _dataset_type: DatasetType,
        ) -> EnrichResult<IncidentRecord> {
            match &self.result {
                Ok(record) => Ok(IncidentRecord {
                    officer_name: record.officer_name.clone(),
                    civilian_name: record.civilian_name.clone(),
                    incident_date: record.incident_date,
                    location: record.location.clone(),
                    severity: record.severity.clone(),
                }),
                Err(msg) => Err(EnrichError::NotFound(msg.clone())),
            }
        }
    }

    #[tokio::test]
    async fn populates_state_from_repository() {
        let repo = FakeRepo {
            result: Ok(IncidentRecord {
                officer_name: Some("James Rodriguez".to_string()),
                civilian_name: None,
                incident_date: NaiveDate::from_ymd_opt(2018, 3, 15),
                location: Some("Houston".to_string()),
                severity: "fatal".to_string(),
            }),
        };
        let mut state = EnrichmentState::new("142", DatasetType::CiviliansShot);

        run(&mut state, &repo).await;

        assert_eq!(state.location.as_deref(), Some("Houston"));
        assert_eq!(state.current_stage, PipelineStage::Extract);
        assert!(state.error_message.is_none());
    }

    #[tokio::test]
    async fn stamps_stage_prefixed_error_on_failure() {
        let repo = FakeRepo {
            result: Err("incident 999 not found".to_string()),
        };
        let mut state = EnrichmentState::new("999", DatasetType::CiviliansShot);

        run(&mut state, &repo).await;

        assert!(state
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Extract failed:"));
    }

    #[tokio::test]
    async fn non_numeric_incident_id_fails_locally() {
        let repo = FakeRepo {
            result: Err("unused".to_string()),
        };
        let mut state = EnrichmentState::new("not-a-number", DatasetType::CiviliansShot);

        run(&mut state, &repo).await;

        assert!(state
            .error_message
            .as_deref()
            .unwrap()
            .contains("invalid incident id"));
    }
}
