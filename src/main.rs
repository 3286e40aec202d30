//! mingle-relay server entry point.
//!
//! Starts the Axum server with the WebSocket chat endpoint and system
//! routes.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mingle_relay::app::build_app;
use mingle_relay::app_state::AppState;
use mingle_relay::config::RelayConfig;
use mingle_relay::geo::GeoLocator;
use mingle_relay::service::ChatService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting mingle-relay");

    // Build service layer
    let chat = Arc::new(ChatService::new(config.send_queue_capacity));
    let geo = Arc::new(GeoLocator::new(&config)?);

    // Build application state and router
    let app = build_app(AppState { chat, geo });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
