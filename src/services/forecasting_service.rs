use std::sync::Arc;

use chrono::Utc;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info, warn};

use crate::config::ForecastConfig;
use crate::errors::AppError;
use crate::models::{ErrorMetrics, ForecastComparison, ModelForecast, ModelKind, PreparedSeries};
use crate::services::arima::{self, ArimaSpec};
use crate::services::series_service;
use crate::state::AppState;

/// Fetch, split and forecast an asset, reusing a cached result when enabled.
///
/// Model fitting is CPU-bound and runs on the blocking pool so it does not
/// stall other requests on the runtime workers.
pub async fn forecast_asset(
    state: &AppState,
    asset: &str,
) -> Result<Arc<ForecastComparison>, AppError> {
    if let Some(cached) = state.forecast_cache.get(asset) {
        debug!("Using cached forecast for {}", asset);
        return Ok(cached);
    }

    let series =
        series_service::load_prepared(state.store.as_ref(), asset, &state.config.split).await?;
    let config = state.config.forecast;

    let comparison =
        tokio::task::spawn_blocking(move || generate_forecast(&series, &config)).await??;
    let comparison = Arc::new(comparison);
    info!(
        "Forecast for {} ready: {} test points",
        asset,
        comparison.test_size()
    );

    if state.forecast_cache.is_enabled() {
        state.forecast_cache.insert(asset, comparison.clone());
        debug!("Forecast cache holds {} assets", state.forecast_cache.len());
    }
    Ok(comparison)
}

/// Fit both models on the train partition and forecast the test horizon.
///
/// The two fits are independent and neither has a fallback: if either fails
/// the whole comparison fails.
pub fn generate_forecast(
    series: &PreparedSeries,
    config: &ForecastConfig,
) -> Result<ForecastComparison, AppError> {
    let train = series.train_open();
    let test = series.test_open();

    info!(
        "Forecasting {}: {} train / {} test points",
        series.asset,
        train.len(),
        test.len()
    );

    let sarimax = run_model(
        ModelKind::Sarimax,
        ArimaSpec::sarimax(config.sarimax_order, config.sarimax_seasonal_order),
        &train,
        &test,
        series.train_size,
        config.confidence_level,
    )?;

    let arima = run_model(
        ModelKind::Arima,
        ArimaSpec::arima(config.arima_order),
        &train,
        &test,
        series.train_size,
        config.confidence_level,
    )?;

    Ok(ForecastComparison {
        asset: series.asset.clone(),
        dates: series.dates(),
        actual_open: series.open_values(),
        train_size: series.train_size,
        sarimax,
        arima,
        generated_at: Utc::now(),
    })
}

fn run_model(
    kind: ModelKind,
    spec: ArimaSpec,
    train: &[f64],
    test: &[f64],
    start_index: usize,
    confidence_level: f64,
) -> Result<ModelForecast, AppError> {
    let model = arima::fit(train, spec).map_err(|e| {
        warn!("{} {} fit failed: {}", kind.label(), spec.order, e);
        e
    })?;

    let path = model.forecast_with_intervals(test.len(), z_score(confidence_level)?)?;
    let metrics = error_metrics(&path.point, test);

    info!(
        "{} {} fitted: sigma2={:.4}, rmse={:.4}",
        kind.label(),
        spec.order,
        model.sigma2,
        metrics.rmse
    );

    Ok(ModelForecast {
        model: kind,
        order: spec.order,
        seasonal_order: spec.seasonal,
        start_index,
        predictions: path.point,
        lower_bound: path.lower,
        upper_bound: path.upper,
        confidence_level,
        sigma2: model.sigma2,
        aic: model.aic,
        metrics,
    })
}

/// Two-sided standard normal quantile for `confidence_level`.
fn z_score(confidence_level: f64) -> Result<f64, AppError> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(AppError::Validation(format!(
            "confidence level must be in (0, 1), got {}",
            confidence_level
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}

/// MAE, RMSE and MAPE of `predicted` against `actual`. MAPE skips zero actuals.
pub fn error_metrics(predicted: &[f64], actual: &[f64]) -> ErrorMetrics {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return ErrorMetrics { mae: 0.0, rmse: 0.0, mape: None };
    }

    let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| a - p).collect();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n as f64;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n as f64).sqrt();

    let percentage: Vec<f64> = errors
        .iter()
        .zip(actual)
        .filter(|(_, a)| **a != 0.0)
        .map(|(e, a)| (e / a).abs() * 100.0)
        .collect();
    let mape = if percentage.is_empty() {
        None
    } else {
        Some(percentage.iter().sum::<f64>() / percentage.len() as f64)
    };

    ErrorMetrics { mae, rmse, mape }
}
