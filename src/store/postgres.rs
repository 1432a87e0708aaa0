use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::db::series_queries;
use crate::errors::AppError;
use crate::models::RawDocument;

use super::SeriesStore;

pub struct PgSeriesStore {
    pool: PgPool,
}

impl PgSeriesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Decodes stored JSONB bodies in order. Fields beyond the ones a
/// `RawDocument` needs are ignored.
pub fn decode_documents(
    asset: &str,
    bodies: Vec<serde_json::Value>,
) -> Result<Vec<RawDocument>, AppError> {
    if bodies.is_empty() {
        return Err(AppError::NotFound(asset.to_string()));
    }

    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            serde_json::from_value::<RawDocument>(body).map_err(|e| {
                warn!("Malformed document #{} for {}: {}", i, asset, e);
                AppError::Parse(format!("malformed document #{} for '{}': {}", i, asset, e))
            })
        })
        .collect()
}

#[async_trait]
impl SeriesStore for PgSeriesStore {
    async fn find_all(&self, asset: &str) -> Result<Vec<RawDocument>, AppError> {
        let bodies = series_queries::fetch_documents(&self.pool, asset).await?;
        debug!("Fetched {} documents for {}", bodies.len(), asset);
        decode_documents(asset, bodies)
    }

    async fn list_assets(&self) -> Result<Vec<String>, AppError> {
        Ok(series_queries::list_assets(&self.pool).await?)
    }
}
