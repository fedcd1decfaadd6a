//! sembed API Server
//!
//! HTTP server for sentence embeddings: resolves and loads the configured
//! model once at startup, then serves `GET /dimensions/` and
//! `POST /encode/`.

use sembed_api::{bootstrap, routes};
use sembed_config::ApplicationConfig;
use std::net::SocketAddr;
use tracing::info;

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    // Initialize environment (load .env, etc.)
    sembed_common::initialize_environment();

    // Load configuration; a missing or malformed config file is fatal
    let config = ApplicationConfig::load()?;

    // Initialize tracing; RUST_LOG overrides the configured default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.telemetry.tracing_level)
                }),
        )
        .init();

    info!(model = %config.model.id, "Starting sembed API server...");

    // Resolve and load the model before binding anything; failure here is a
    // startup abort, not a degraded service
    let state = bootstrap::initialize_app_state(&config).await?;

    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
