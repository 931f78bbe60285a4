mod ark;
mod config;
mod copy;
mod intake;
mod models;
mod orchestrator;
mod pdf;
mod prompts;
mod render;
mod routes;
mod theme;

use anyhow::Context;
use routes::{router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use tower_http::cors::{CorsLayer, Any};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    match &config.api_key {
        Some(key) => tracing::info!("Using configured API key: {}", ark::redact_key(key)),
        None => tracing::info!("No ARK_API_KEY configured; the browser must supply one per run"),
    }
    tracing::info!(base = %config.api_base, text_model = %config.text_model, image_model = %config.image_model, "Ark endpoint");

    let port = config.port;
    let app = router(AppState::new(config))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        );

    let addr = SocketAddr::from(([0,0,0,0], port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
