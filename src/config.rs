use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context};

use crate::models::{ModelOrder, SeasonalOrder};

pub const DEFAULT_PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Chronological train/test split settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub train_ratio: f64,
    pub min_series_len: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            min_series_len: 10,
        }
    }
}

/// Orders of the two forecasting models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub sarimax_order: ModelOrder,
    pub sarimax_seasonal_order: SeasonalOrder,
    pub arima_order: ModelOrder,
    pub confidence_level: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            sarimax_order: ModelOrder::new(3, 2, 3),
            sarimax_seasonal_order: SeasonalOrder::NONE,
            arima_order: ModelOrder::new(4, 1, 3),
            confidence_level: 0.95,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub default_asset: String,
    pub plotly_cdn_url: String,
    pub run_migrations: bool,
    pub forecast_cache_ttl_secs: u64,
    pub split: SplitConfig,
    pub forecast: ForecastConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults_split = SplitConfig::default();
        let defaults_forecast = ForecastConfig::default();

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let config = Self {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5001)))?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            default_asset: lookup("DEFAULT_ASSET").unwrap_or_else(|| "bitcoin".to_string()),
            plotly_cdn_url: lookup("PLOTLY_CDN_URL")
                .unwrap_or_else(|| DEFAULT_PLOTLY_CDN_URL.to_string()),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            forecast_cache_ttl_secs: parse_or(&lookup, "FORECAST_CACHE_TTL_SECS", 0)?,
            split: SplitConfig {
                train_ratio: parse_or(&lookup, "TRAIN_RATIO", defaults_split.train_ratio)?,
                min_series_len: parse_or(&lookup, "MIN_SERIES_LEN", defaults_split.min_series_len)?,
            },
            forecast: ForecastConfig {
                sarimax_order: parse_or(&lookup, "SARIMAX_ORDER", defaults_forecast.sarimax_order)?,
                sarimax_seasonal_order: parse_or(
                    &lookup,
                    "SARIMAX_SEASONAL_ORDER",
                    defaults_forecast.sarimax_seasonal_order,
                )?,
                arima_order: parse_or(&lookup, "ARIMA_ORDER", defaults_forecast.arima_order)?,
                confidence_level: parse_or(
                    &lookup,
                    "FORECAST_CONFIDENCE",
                    defaults_forecast.confidence_level,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.split.train_ratio > 0.0 && self.split.train_ratio < 1.0) {
            return Err(anyhow!(
                "TRAIN_RATIO must be strictly between 0 and 1, got {}",
                self.split.train_ratio
            ));
        }
        if self.split.min_series_len < 2 {
            return Err(anyhow!("MIN_SERIES_LEN must be at least 2"));
        }
        if self.default_asset.trim().is_empty() {
            return Err(anyhow!("DEFAULT_ASSET must not be empty"));
        }
        if !(self.forecast.confidence_level > 0.0 && self.forecast.confidence_level < 1.0) {
            return Err(anyhow!(
                "FORECAST_CONFIDENCE must be strictly between 0 and 1, got {}",
                self.forecast.confidence_level
            ));
        }
        if self.plotly_cdn_url.trim().is_empty() {
            return Err(anyhow!("PLOTLY_CDN_URL must not be empty"));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/coins")])).unwrap();
        assert_eq!(config.bind_addr.port(), 5001);
        assert_eq!(config.default_asset, "bitcoin");
        assert_eq!(config.split.train_ratio, 0.8);
        assert_eq!(config.forecast.sarimax_order, ModelOrder::new(3, 2, 3));
        assert_eq!(config.forecast.arima_order, ModelOrder::new(4, 1, 3));
        assert!(config.forecast.sarimax_seasonal_order.is_none());
        assert_eq!(config.forecast_cache_ttl_secs, 0);
        assert_eq!(config.forecast.confidence_level, 0.95);
        assert_eq!(config.plotly_cdn_url, DEFAULT_PLOTLY_CDN_URL);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/coins"),
            ("TRAIN_RATIO", "0.75"),
            ("ARIMA_ORDER", "2,1,2"),
            ("SARIMAX_SEASONAL_ORDER", "1,0,1,7"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("FORECAST_CONFIDENCE", "0.8"),
            ("PLOTLY_CDN_URL", "/static/plotly.min.js"),
        ]))
        .unwrap();
        assert_eq!(config.forecast.confidence_level, 0.8);
        assert_eq!(config.plotly_cdn_url, "/static/plotly.min.js");
        assert_eq!(config.split.train_ratio, 0.75);
        assert_eq!(config.forecast.arima_order, ModelOrder::new(2, 1, 2));
        assert_eq!(config.forecast.sarimax_seasonal_order.period, 7);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(AppConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        for (key, value) in [
            ("TRAIN_RATIO", "1.5"),
            ("ARIMA_ORDER", "4,1"),
            ("MIN_SERIES_LEN", "1"),
            ("FORECAST_CONFIDENCE", "1.0"),
            ("FORECAST_CONFIDENCE", "0"),
            ("FORECAST_CONFIDENCE", "high"),
            ("PLOTLY_CDN_URL", " "),
        ] {
            let result = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://localhost/coins"),
                (key, value),
            ]));
            assert!(result.is_err(), "{}={} should be rejected", key, value);
        }
    }
}
