use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::RawDocument;

use super::SeriesStore;

/// Store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesStore {
    collections: HashMap<String, Vec<RawDocument>>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, asset: &str, documents: Vec<RawDocument>) -> Self {
        self.collections.insert(asset.to_string(), documents);
        self
    }
}

#[async_trait]
impl SeriesStore for InMemorySeriesStore {
    async fn find_all(&self, asset: &str) -> Result<Vec<RawDocument>, AppError> {
        match self.collections.get(asset) {
            Some(docs) if !docs.is_empty() => Ok(docs.clone()),
            _ => Err(AppError::NotFound(asset.to_string())),
        }
    }

    async fn list_assets(&self) -> Result<Vec<String>, AppError> {
        let mut assets: Vec<String> = self.collections.keys().cloned().collect();
        assets.sort();
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(date: &str) -> RawDocument {
        RawDocument {
            date: date.to_string(),
            open: 1.0,
            marketcap: 2.0,
            volume: 3.0,
        }
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let store = InMemorySeriesStore::new().with_asset("bitcoin", vec![doc("2021-01-01")]);
        let err = store.find_all("dogecoin").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(asset) if asset == "dogecoin"));
    }

    #[tokio::test]
    async fn test_empty_collection_is_not_found() {
        let store = InMemorySeriesStore::new().with_asset("tether", vec![]);
        assert!(matches!(store.find_all("tether").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lists_assets_sorted() {
        let store = InMemorySeriesStore::new()
            .with_asset("ethereum", vec![doc("2021-01-01")])
            .with_asset("bitcoin", vec![doc("2021-01-01")]);
        assert_eq!(store.list_assets().await.unwrap(), vec!["bitcoin", "ethereum"]);
    }
}
