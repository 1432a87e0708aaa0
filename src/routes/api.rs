use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{ChartDocument, ForecastComparison, SeriesRecord};
use crate::services::{chart_service, forecasting_service, series_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets))
        .route("/:asset/series", get(get_series))
        .route("/:asset/forecast", get(get_forecast))
        .route("/:asset/forecast/chart", get(get_forecast_chart))
}

pub async fn list_assets(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    info!("GET /api/assets - Listing assets");
    let assets = state.store.list_assets().await.map_err(|e| {
        error!("Failed to list assets: {}", e);
        e
    })?;
    Ok(Json(assets))
}

pub async fn get_series(
    Path(asset): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SeriesRecord>>, AppError> {
    info!("GET /api/assets/{}/series - Getting history", asset);
    let records = series_service::load_history(state.store.as_ref(), &asset)
        .await
        .map_err(|e| {
            error!("Failed to load history for {}: {}", asset, e);
            e
        })?;
    Ok(Json(records))
}

pub async fn get_forecast(
    Path(asset): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ForecastComparison>, AppError> {
    info!("GET /api/assets/{}/forecast - Forecasting", asset);
    let comparison = forecasting_service::forecast_asset(&state, &asset)
        .await
        .map_err(|e| {
            error!("Failed to forecast {}: {}", asset, e);
            e
        })?;
    Ok(Json(comparison.as_ref().clone()))
}

pub async fn get_forecast_chart(
    Path(asset): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ChartDocument>, AppError> {
    info!("GET /api/assets/{}/forecast/chart - Building forecast chart", asset);
    let comparison = forecasting_service::forecast_asset(&state, &asset)
        .await
        .map_err(|e| {
            error!("Failed to forecast {}: {}", asset, e);
            e
        })?;
    Ok(Json(chart_service::forecast_chart(&comparison)))
}
