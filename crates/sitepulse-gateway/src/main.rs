//! Sitepulse Gateway - visitor counter HTTP API
//!
//! This is the main entry point for the gateway service.
//!
//! # Configuration
//!
//! Settings are read from the environment, after loading a `.env` file from
//! the working directory if one exists. See [`GatewayConfig::from_lookup`]
//! for the recognised keys.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitepulse_gateway::{create_router, spawn_expiry_sweep, GatewayConfig, GatewayState};
use sitepulse_presence::PresenceService;
use sitepulse_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sitepulse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sitepulse Gateway");
    if let Some(path) = dotenv_loaded {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        online_timeout_seconds = config.online_timeout_seconds,
        sweep_interval_seconds = config.sweep_interval_seconds,
        day_utc_offset_minutes = config.day_utc_offset_minutes,
        "Gateway configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let presence_config = config.presence_config();
    let sweep_interval = presence_config.sweep_interval();
    let presence = Arc::new(PresenceService::new(store, presence_config));

    // Start the expiry sweep as a background task
    if let Some(interval) = sweep_interval {
        spawn_expiry_sweep(Arc::clone(&presence), interval);
        tracing::info!(interval_seconds = interval.as_secs(), "Started session expiry sweep");
    } else {
        tracing::info!("Session expiry sweep disabled, expiring lazily only");
    }

    let listen_addr = config.listen_addr.clone();
    let app = create_router(GatewayState::new(presence, config));

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
