use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::ForecastComparison;

// ten years
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub comparison: Arc<ForecastComparison>,
    pub cached_at: DateTime<Utc>,
}

/// Thread-safe per-asset cache of finished forecasts.
/// A TTL of zero disables caching, so every request refits both models.
#[derive(Clone)]
pub struct ForecastCache {
    ttl: Duration,
    entries: Arc<DashMap<String, CachedForecast>>,
}

impl ForecastCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    pub fn get(&self, asset: &str) -> Option<Arc<ForecastComparison>> {
        if !self.is_enabled() {
            return None;
        }

        if let Some(entry) = self.entries.get(asset) {
            if Utc::now() < entry.cached_at + self.ttl {
                return Some(entry.comparison.clone());
            }
            drop(entry); // release the read lock before removing
            self.entries.remove(asset);
        }
        None
    }

    pub fn insert(&self, asset: &str, comparison: Arc<ForecastComparison>) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            asset.to_string(),
            CachedForecast {
                comparison,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
