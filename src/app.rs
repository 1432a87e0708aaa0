use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{api, graph, health};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::<AppState>::new()
        .route("/", get(graph::home))
        .nest("/graph", graph::router())
        .nest("/api/assets", api::router().layer(api_cors))
        .nest("/health", health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::models::RawDocument;
    use crate::store::InMemorySeriesStore;
    use crate::test_support::{daily_documents, wavy_open};

    fn app() -> Router {
        let mut broken = daily_documents(12, wavy_open);
        broken[3] = RawDocument {
            date: "03/04/2021".to_string(),
            ..broken[3].clone()
        };

        let store = InMemorySeriesStore::new()
            .with_asset("bitcoin", daily_documents(100, wavy_open))
            .with_asset("ethereum", daily_documents(40, |i| 2000.0 + wavy_open(i) / 10.0))
            .with_asset("tiny", daily_documents(5, wavy_open))
            .with_asset("broken", broken)
            .with_asset("wrapped bitcoin", daily_documents(30, wavy_open));
        create_app(AppState::for_tests(store))
    }

    async fn get(uri: &str) -> Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(uri: &str, form: &str) -> Response {
        app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_home_redirects_to_default_asset() {
        let response = get("/").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/graph/bitcoin");
    }

    #[tokio::test]
    async fn test_graph_page_renders_three_charts() {
        let response = get("/graph/bitcoin").await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert_eq!(html.matches("Plotly.newPlot").count(), 3);
        assert!(html.contains("open value of bitcoin"));
        assert!(html.contains(r#"<option value="ethereum">"#));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found_page() {
        let response = get("/graph/dogecoin").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Error 404"));

        let response = get("/graph/dogecoin/predict").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_date_is_bad_request() {
        let response = get("/graph/broken").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_selection_redirects() {
        let response = post_form("/graph/bitcoin", "comp_select=ethereum").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/graph/ethereum");

        let response = post_form("/graph/bitcoin/predict", "comp_select=ethereum").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/graph/ethereum/predict");
    }

    #[tokio::test]
    async fn test_selection_with_space_resolves_after_redirect() {
        let response = post_form("/graph/bitcoin", "comp_select=wrapped+bitcoin").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/graph/wrapped%20bitcoin");

        let followed = get(location(&response)).await;
        assert_eq!(followed.status(), StatusCode::OK);
        assert!(body_text(followed).await.contains("open value of wrapped bitcoin"));

        let response = post_form("/graph/bitcoin/predict", "comp_select=wrapped+bitcoin").await;
        assert_eq!(location(&response), "/graph/wrapped%20bitcoin/predict");
        let followed = get(location(&response)).await;
        assert_eq!(followed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_selection_is_bad_request() {
        let response = post_form("/graph/bitcoin", "").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_form("/graph/bitcoin/predict", "comp_select=").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_page_renders_comparison() {
        let response = get("/graph/bitcoin/predict").await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert_eq!(html.matches("Plotly.newPlot").count(), 1);
        assert!(html.contains("Prediction of BITCOIN values with SARIMAX and ARIMA Models"));
    }

    #[tokio::test]
    async fn test_short_series_cannot_be_forecast() {
        let response = get("/graph/tiny/predict").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_api_forecast_json() {
        let response = get("/api/assets/bitcoin/forecast").await;
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["train_size"], 80);
        assert_eq!(value["sarimax"]["predictions"].as_array().unwrap().len(), 20);
        assert_eq!(value["arima"]["start_index"], 80);
    }

    #[tokio::test]
    async fn test_api_lists_assets_and_series() {
        let response = get("/api/assets").await;
        assert_eq!(response.status(), StatusCode::OK);
        let assets: Vec<String> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(assets, vec!["bitcoin", "broken", "ethereum", "tiny", "wrapped bitcoin"]);

        let response = get("/api/assets/ethereum/series").await;
        let series: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(series.as_array().unwrap().len(), 40);
        assert_eq!(series[0]["date"], "2021-01-01");

        let response = get("/api/assets/dogecoin/series").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let response = get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }
}
