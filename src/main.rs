mod app;
mod config;
mod db;
mod errors;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod store;
mod views;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::logging::LoggingConfig;
use crate::state::AppState;
use crate::store::PgSeriesStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    if config.forecast_cache_ttl_secs > 0 {
        tracing::info!("Forecast cache enabled, ttl {}s", config.forecast_cache_ttl_secs);
    }

    let addr = config.bind_addr;
    let state = AppState::new(Arc::new(PgSeriesStore::new(pool)), config);
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Coinchart backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
