//! Hearth - Personal Dashboard Backend
//!
//! Session-authenticated REST API for a personal dashboard: links,
//! todos, notes, calendar events, and a weather proxy.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth::{api, config, AppState, Result};

/// JSON payloads above this are rejected before parsing.
const MAX_BODY_BYTES: usize = 100 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::init();
    tracing::info!(
        "Starting Hearth server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize application state
    let state = AppState::new().await?;
    tracing::info!("Application state initialized");

    // Initialize startup time for uptime tracking
    api::status::init_startup_time();

    // Build router
    let app = Router::new()
        .nest("/api", api::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid address");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("========================================");
    tracing::info!("  HEARTH SERVER STARTED SUCCESSFULLY");
    tracing::info!("  Ready to accept connections on {}", addr);
    tracing::info!("========================================");

    axum::serve(listener, app).await?;

    Ok(())
}
