//! Visitor presence tracking for sitepulse.
//!
//! This crate provides the business logic behind the visitor counter: it
//! turns per-client heartbeats into an "online now" count and maintains the
//! lifetime and per-day visit counters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Gateway (HTTP)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PresenceService                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Heartbeat  │ │   Expiry    │ │   Daily rollover    │   │
//! │  │   upsert    │ │  (timeout)  │ │   + visit counters  │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                      ┌──────────────┐
//!                      │    Store     │
//!                      │  (RocksDB)   │
//!                      └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitepulse_core::VisitorSessionId;
//! use sitepulse_presence::{ClientInfo, PresenceService, PresenceTracker};
//! use sitepulse_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/sitepulse")?);
//! let presence = PresenceService::with_defaults(store);
//!
//! let session_id = VisitorSessionId::parse("visitor-token")?;
//! let ack = presence.heartbeat(&session_id, ClientInfo::default()).await?;
//!
//! let stats = presence.get_stats().await?;
//! if ack.new_session {
//!     presence.record_visit(&stats.counters_id).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Expiry
//!
//! There is no disconnect event. A session counts as online while its last
//! heartbeat is within the online timeout (3 minutes by default); stale
//! sessions are deleted lazily by `heartbeat`, `get_stats`, and
//! `record_visit`, and optionally by a periodic [`PresenceTracker::sweep_expired`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod daily;
pub mod error;
pub mod expiry;
pub mod service;
pub mod types;

pub use error::{PresenceError, Result};
pub use service::{PresenceService, PresenceTracker};
pub use types::{ClientInfo, HeartbeatAck, PresenceConfig, VisitorStats};

// Re-export commonly used types from dependencies for convenience
pub use sitepulse_core::{CountersId, VisitorSessionId};
pub use sitepulse_store::{PresenceSession, VisitorCounters};
