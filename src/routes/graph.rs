use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::services::{chart_service, forecasting_service, series_service};
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:asset", get(show_graph).post(select_graph))
        .route("/:asset/predict", get(show_prediction).post(select_prediction))
}

/// Form posted by the asset selector
#[derive(Debug, Deserialize)]
pub struct AssetSelection {
    pub comp_select: Option<String>,
}

impl AssetSelection {
    fn asset(self) -> Result<String, AppError> {
        self.comp_select
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("no asset selected".to_string()))
    }
}

/// Errors on HTML routes are rendered as a page rather than plain text.
pub struct PageError(AppError);

impl From<AppError> for PageError {
    fn from(value: AppError) -> Self {
        PageError(value)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let page = views::error_page(status.as_u16(), &self.0.public_message());
        (status, Html(page)).into_response()
    }
}

fn log_failure(route: &str, asset: &str, err: &AppError) {
    match err {
        AppError::NotFound(_) | AppError::Parse(_) | AppError::Validation(_) => {
            warn!("{} for {} rejected: {}", route, asset, err)
        }
        _ => error!("{} for {} failed: {}", route, asset, err),
    }
}

pub fn graph_path(asset: &str) -> String {
    format!("/graph/{}", views::encode_segment(asset))
}

pub fn predict_path(asset: &str) -> String {
    format!("/graph/{}/predict", views::encode_segment(asset))
}

pub async fn home(State(state): State<AppState>) -> Redirect {
    info!("GET / - Redirecting to {}", state.config.default_asset);
    Redirect::to(&graph_path(&state.config.default_asset))
}

pub async fn show_graph(
    Path(asset): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>, PageError> {
    info!("GET /graph/{} - Rendering market charts", asset);

    let render = async {
        let records = series_service::load_history(state.store.as_ref(), &asset).await?;
        let assets = state.store.list_assets().await?;
        let figures = chart_service::raw_metric_charts(&asset, &records)
            .iter()
            .map(chart_service::to_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok::<_, AppError>(views::graph_page(
            &asset,
            &assets,
            &figures,
            &state.config.plotly_cdn_url,
        ))
    };

    let page = render.await.map_err(|e| {
        log_failure("GET /graph", &asset, &e);
        e
    })?;
    Ok(Html(page))
}

pub async fn select_graph(
    Path(current): Path<String>,
    Form(selection): Form<AssetSelection>,
) -> Result<Redirect, PageError> {
    let asset = selection.asset().map_err(|e| {
        log_failure("POST /graph", &current, &e);
        e
    })?;
    info!("POST /graph/{} - Switching to {}", current, asset);
    Ok(Redirect::to(&graph_path(&asset)))
}

pub async fn show_prediction(
    Path(asset): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>, PageError> {
    info!("GET /graph/{}/predict - Rendering forecast comparison", asset);

    let render = async {
        let comparison = forecasting_service::forecast_asset(&state, &asset).await?;
        let assets = state.store.list_assets().await?;
        let figure = chart_service::to_json(&chart_service::forecast_chart(&comparison))?;
        Ok::<_, AppError>(views::predict_page(
            &asset,
            &assets,
            &figure,
            &state.config.plotly_cdn_url,
        ))
    };

    let page = render.await.map_err(|e| {
        log_failure("GET /graph/predict", &asset, &e);
        e
    })?;
    Ok(Html(page))
}

pub async fn select_prediction(
    Path(current): Path<String>,
    Form(selection): Form<AssetSelection>,
) -> Result<Redirect, PageError> {
    let asset = selection.asset().map_err(|e| {
        log_failure("POST /graph/predict", &current, &e);
        e
    })?;
    info!("POST /graph/{}/predict - Switching to {}", current, asset);
    Ok(Redirect::to(&predict_path(&asset)))
}
