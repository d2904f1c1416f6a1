//! # Stockroom API
//!
//! REST server for the inventory service.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Client ───► HTTP (axum) ───► Handlers ───► Ledger/Repos ───► Postgres │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                              Media host                                 │
//! │                           (image uploads)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod media;
mod routes;
mod state;

use std::net::SocketAddr;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stockroom_db::Database;

use crate::config::ApiConfig;
use crate::media::MediaClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is a development convenience; real deployments set the
    // environment directly.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stockroom_api=debug".into()),
        )
        .init();

    info!("Starting Stockroom API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(port = config.port, "Configuration loaded");

    // Connect to database (runs migrations)
    let db = Database::connect(config.db_config()).await?;
    info!("Connected to PostgreSQL");

    // Media host is optional; without it image uploads fail politely.
    if config.media.is_none() {
        warn!("MEDIA_BASE_URL not set; image uploads will be rejected");
    }
    let media = MediaClient::new(config.media.clone());

    let state = AppState { db, media };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// CORS policy from the configured origin allowlist; an empty list admits
/// any origin.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let list = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
