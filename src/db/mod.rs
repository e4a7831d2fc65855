//! Database collaborator: a read-only connection to the normalized
//! incident store, queried once per traversal by the Extract node.

pub mod schema;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::EnrichResult;
use crate::state::DatasetType;
use schema::IncidentRecord;

/// Abstraction over incident lookup so the Extract node can be tested
/// against a fake without a live database.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    async fn fetch_incident(
        &self,
        incident_id: i64,
        dataset_type: DatasetType,
    ) -> EnrichResult<IncidentRecord>;
}

/// Postgres-backed `IncidentRepository`.
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> EnrichResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect(database_url)
            .await?;

        log::info!("connected to incident database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IncidentRepository for Database {
    async fn fetch_incident(
        &self,
        incident_id: i64,
        dataset_type: DatasetType,
    ) -> EnrichResult<IncidentRecord> {
        schema::fetch_incident(&self.pool, incident_id, dataset_type).await
    }
}
