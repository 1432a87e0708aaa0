pub mod arima;
pub mod chart_service;
pub mod forecast_cache;
pub mod forecasting_service;
pub mod series_service;
