use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::RawDocument;

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::InMemorySeriesStore;
pub use postgres::PgSeriesStore;

/// Read-only access to the per-asset document collections.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Every document of `asset` in stored order. An asset without documents
    /// is reported as `AppError::NotFound`.
    async fn find_all(&self, asset: &str) -> Result<Vec<RawDocument>, AppError>;

    /// Known asset identifiers, sorted.
    async fn list_assets(&self) -> Result<Vec<String>, AppError>;
}
