//! Schema and queries against the normalized incident database.
//!
//! The two TJI-style datasets store the same concepts (a first-sequence
//! officer, a first-sequence civilian, an outcome) under different column
//! and table names, so each dataset gets its own query.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::{EnrichError, EnrichResult};
use crate::state::DatasetType;

/// Baseline fields pulled from the database for one incident, before any
/// media enrichment.
pub struct IncidentRecord {
    pub officer_name: Option<String>,
    pub civilian_name: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub severity: String,
}

fn join_name(first: Option<String>, last: Option<String>) -> Option<String> {
    let parts: Vec<String> = [first, last].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[derive(sqlx::FromRow)]
struct CiviliansShotRow {
    date_incident: Option<NaiveDate>,
    incident_city: Option<String>,
    incident_county: Option<String>,
    officer_first: Option<String>,
    officer_last: Option<String>,
    civilian_first: Option<String>,
    civilian_last: Option<String>,
    civilian_died: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct OfficersShotRow {
    date_incident: Option<NaiveDate>,
    incident_city: Option<String>,
    incident_county: Option<String>,
    officer_first: Option<String>,
    officer_last: Option<String>,
    civilian_first: Option<String>,
    civilian_last: Option<String>,
    officer_harm: Option<String>,
}

const CIVILIANS_SHOT_QUERY: &str = r#"
    SELECT
        i.date_incident,
        i.incident_city,
        i.incident_county,
        o.name_first AS officer_first,
        o.name_last AS officer_last,
        c.name_first AS civilian_first,
        c.name_last AS civilian_last,
        v.civilian_died
    FROM incidents_civilians_shot i
    LEFT JOIN incident_civilians_shot_officers_involved oi
        ON i.incident_id = oi.incident_id AND oi.officer_sequence = 1
    LEFT JOIN officers o ON oi.officer_id = o.officer_id
    LEFT JOIN incident_civilians_shot_victims v
        ON i.incident_id = v.incident_id
    LEFT JOIN civilians c ON v.civilian_id = c.civilian_id
    WHERE i.incident_id = $1
    LIMIT 1
"#;

const OFFICERS_SHOT_QUERY: &str = r#"
    SELECT
        i.date_incident,
        i.incident_city,
        i.incident_county,
        o.name_first AS officer_first,
        o.name_last AS officer_last,
        c.name_first AS civilian_first,
        c.name_last AS civilian_last,
        v.officer_harm
    FROM incidents_officers_shot i
    LEFT JOIN incident_officers_shot_victims v
        ON i.incident_id = v.incident_id
    LEFT JOIN officers o ON v.officer_id = o.officer_id
    LEFT JOIN incident_officers_shot_shooters s
        ON i.incident_id = s.incident_id AND s.civilian_sequence = 1
    LEFT JOIN civilians c ON s.civilian_id = c.civilian_id
    WHERE i.incident_id = $1
    LIMIT 1
"#;

/// Fetch one incident record with dataset-aware field mapping.
pub async fn fetch_incident(
    pool: &PgPool,
    incident_id: i64,
    dataset_type: DatasetType,
) -> EnrichResult<IncidentRecord> {
    match dataset_type {
        DatasetType::CiviliansShot => {
            let row: CiviliansShotRow = sqlx::query_as(CIVILIANS_SHOT_QUERY)
                .bind(incident_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| {
                    EnrichError::NotFound(format!(
                        "incident {} not found in civilians_shot",
                        incident_id
                    ))
                })?;

            let severity = match row.civilian_died {
                Some(true) => "fatal",
                Some(false) => "non-fatal",
                None => "unknown",
            }
            .to_string();

            Ok(IncidentRecord {
                officer_name: join_name(row.officer_first, row.officer_last),
                civilian_name: join_name(row.civilian_first, row.civilian_last),
                incident_date: row.date_incident,
                location: row.incident_city.or(row.incident_county),
                severity,
            })
        }
        DatasetType::OfficersShot => {
            let row: OfficersShotRow = sqlx::query_as(OFFICERS_SHOT_QUERY)
                .bind(incident_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| {
                    EnrichError::NotFound(format!(
                        "incident {} not found in officers_shot",
                        incident_id
                    ))
                })?;

            let severity = match row.officer_harm.as_deref() {
                Some("DEATH") => "fatal",
                Some("INJURY") => "non-fatal",
                _ => "unknown",
            }
            .to_string();

            Ok(IncidentRecord {
                officer_name: join_name(row.officer_first, row.officer_last),
                civilian_name: join_name(row.civilian_first, row.civilian_last),
                incident_date: row.date_incident,
                location: row.incident_city.or(row.incident_county),
                severity,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_name_prefers_both_parts() {
        assert_eq!(
            join_name(Some("James".to_string()), Some("Rodriguez".to_string())),
            Some("James Rodriguez".to_string())
        );
    }

    #[test]
    fn join_name_handles_missing_first() {
        assert_eq!(
            join_name(None, Some("Rodriguez".to_string())),
            Some("Rodriguez".to_string())
        );
    }

    #[test]
    fn join_name_none_when_both_absent() {
        assert_eq!(join_name(None, None), None);
    }
}
