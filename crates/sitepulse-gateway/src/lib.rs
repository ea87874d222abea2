//! HTTP gateway for the sitepulse visitor counter.
//!
//! This crate exposes the presence tracker over a small JSON API used by the
//! website's client script:
//!
//! - heartbeats that keep a visitor counted as online
//! - visit recording against the lifetime and daily counters
//! - a read endpoint for the current figures
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Browser client script                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      sitepulse-gateway                      │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │   Router    │ │  Handlers   │ │   Expiry sweep      │   │
//! │  │ + middleware│ │             │ │   (background)      │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                      ┌──────────────┐
//!                      │   Presence   │
//!                      │   service    │
//!                      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitepulse_gateway::{create_router, GatewayConfig, GatewayState};
//! use sitepulse_presence::PresenceService;
//! use sitepulse_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let store = Arc::new(RocksStore::open(&config.data_dir)?);
//! let presence = Arc::new(PresenceService::new(store, config.presence_config()));
//!
//! let listen_addr = config.listen_addr.clone();
//! let app = create_router(GatewayState::new(presence, config));
//!
//! let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod sweep;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
pub use sweep::spawn_expiry_sweep;
