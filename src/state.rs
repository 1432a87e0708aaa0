use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::forecast_cache::ForecastCache;
use crate::store::SeriesStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SeriesStore>,
    pub config: Arc<AppConfig>,
    pub forecast_cache: ForecastCache,
}

impl AppState {
    pub fn new(store: Arc<dyn SeriesStore>, config: AppConfig) -> Self {
        let forecast_cache = ForecastCache::new(config.forecast_cache_ttl_secs);
        Self {
            store,
            config: Arc::new(config),
            forecast_cache,
        }
    }

    #[cfg(test)]
    pub fn for_tests(store: crate::store::InMemorySeriesStore) -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/test".to_string()),
            _ => None,
        })
        .expect("default config is valid");
        Self::new(Arc::new(store), config)
    }
}
