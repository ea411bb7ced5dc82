//! moodreeld — face-attribute movie recommendation daemon.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod http;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environments set variables directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("moodreeld starting");

    let config = config::Config::from_env();

    let (engine, status) = engine::spawn_engine(&config.analyzer_config())?;
    tracing::info!(
        emotion_model = status.emotion_model,
        age_gender_model = status.age_gender_model,
        "inference engine ready"
    );

    let catalog = match &config.catalog_token {
        Some(token) => Some(moodreel_catalog::CatalogClient::new(
            &config.catalog_base_url,
            token,
        )?),
        None => {
            tracing::warn!("TMDB_BEARER_TOKEN not set; recommendations disabled");
            None
        }
    };

    let state = Arc::new(http::AppState {
        engine,
        status,
        catalog,
        analyze_timeout: Duration::from_secs(config.analyze_timeout_secs),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, http::router(state, &config.cors_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("moodreeld shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
