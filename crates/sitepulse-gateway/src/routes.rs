//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sitepulse_presence::PresenceTracker;

use crate::handlers::{health, visitors};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /api/visitor-stats` - Current visitor statistics
/// - `POST /api/visitor-stats/heartbeat` - Visitor heartbeat
/// - `POST /api/visitor-stats/record-visit` - Count a new visit
/// - `POST /api/visitor-stats/update` - Older path for `record-visit`
pub fn create_router<P>(state: GatewayState<P>) -> Router
where
    P: PresenceTracker + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/visitor-stats", get(visitors::get_stats::<P>))
        .route(
            "/api/visitor-stats/heartbeat",
            post(visitors::heartbeat::<P>),
        )
        .route(
            "/api/visitor-stats/record-visit",
            post(visitors::record_visit::<P>),
        )
        .route(
            "/api/visitor-stats/update",
            post(visitors::record_visit::<P>),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
