//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use sitepulse_presence::PresenceTracker;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
pub struct GatewayState<P>
where
    P: PresenceTracker,
{
    /// The presence tracker for heartbeats and visitor counters.
    pub presence: Arc<P>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<P> GatewayState<P>
where
    P: PresenceTracker,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(presence: Arc<P>, config: GatewayConfig) -> Self {
        Self { presence, config }
    }
}

impl<P> Clone for GatewayState<P>
where
    P: PresenceTracker,
{
    fn clone(&self) -> Self {
        Self {
            presence: Arc::clone(&self.presence),
            config: self.config.clone(),
        }
    }
}
