//! Registre Server - visitor sign-in register
//!
//! Serves the kiosk sign-in form and the weekly PDF register.

use std::net::SocketAddr;

use anyhow::Context;

use registre_server::{api, config::AppConfig, logging, repository, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing, keep the file writer alive until shutdown
    let _log_guard = logging::init_logging(&config.logging);

    tracing::info!("Starting Registre Server v{}", env!("CARGO_PKG_VERSION"));

    // Open the record store
    let store = repository::connect(&config.storage)
        .await
        .context("Failed to open the record store")?;

    tracing::info!(backend = ?config.storage.backend, "Record store ready");

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", config.server.host))?,
        config.server.port,
    );

    // Create application state and router
    let state = AppState::new(config, store);
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
