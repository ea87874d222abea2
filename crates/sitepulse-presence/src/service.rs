//! Presence service implementation.
//!
//! This module provides the `PresenceTracker` trait and the `PresenceService`
//! implementation that turns heartbeats into online counts and maintains the
//! visit counters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sitepulse_core::{Clock, CountersId, SystemClock, VisitorSessionId};
use sitepulse_store::{PresenceSession, Store, VisitorCounters};

use crate::daily;
use crate::error::{PresenceError, Result};
use crate::expiry;
use crate::types::{ClientInfo, HeartbeatAck, PresenceConfig, VisitorStats};

/// Trait defining the presence tracking operations.
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// Record a heartbeat for a visitor session.
    ///
    /// Creates the session if no live one exists for the token, otherwise
    /// refreshes its `last_activity`. Stale sessions are expired first, so a
    /// heartbeat for an evicted token reports `new_session = true`.
    async fn heartbeat(
        &self,
        session_id: &VisitorSessionId,
        client: ClientInfo,
    ) -> Result<HeartbeatAck>;

    /// Count one new visit against the given counters row.
    ///
    /// Call this once per new visit, not per heartbeat.
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::CountersNotFound` if the row doesn't exist.
    async fn record_visit(&self, counters_id: &CountersId) -> Result<VisitorStats>;

    /// Read the current visitor statistics.
    ///
    /// Creates a zeroed counters row on first use, applies the daily reset,
    /// and reports a freshly computed online count.
    async fn get_stats(&self) -> Result<VisitorStats>;

    /// Delete sessions that are past the online timeout.
    ///
    /// Returns the number of sessions removed.
    async fn sweep_expired(&self) -> Result<u64>;
}

/// The main presence service implementation.
pub struct PresenceService<S: Store, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: Arc<C>,
    config: PresenceConfig,
}

impl<S: Store> PresenceService<S, SystemClock> {
    /// Create a new presence service using the wall clock.
    #[must_use]
    pub fn new(store: Arc<S>, config: PresenceConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, PresenceConfig::default())
    }
}

impl<S: Store, C: Clock> PresenceService<S, C> {
    /// Create a new presence service with an explicit time source.
    #[must_use]
    pub fn with_clock(store: Arc<S>, config: PresenceConfig, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PresenceConfig {
        &self.config
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        expiry::online_cutoff(now, self.config.online_timeout())
    }

    /// Find the counters row the stats endpoint reports on, creating it if absent.
    fn ensure_counters(&self, now: DateTime<Utc>) -> Result<CountersId> {
        if let Some(counters) = self.store.latest_counters()? {
            return Ok(counters.counters_id);
        }

        let counters = VisitorCounters::zeroed(CountersId::generate(), now);
        self.store.put_counters(&counters)?;
        tracing::info!(counters_id = %counters.counters_id, "Initialized visitor counters");
        Ok(counters.counters_id)
    }
}

fn overflow(counters_id: &CountersId) -> PresenceError {
    PresenceError::Internal(format!("visit counter overflow on counters {counters_id}"))
}

#[async_trait]
impl<S: Store + 'static, C: Clock + 'static> PresenceTracker for PresenceService<S, C> {
    async fn heartbeat(
        &self,
        session_id: &VisitorSessionId,
        client: ClientInfo,
    ) -> Result<HeartbeatAck> {
        let now = self.clock.now();

        // Evict first so a token that timed out comes back as a new session
        expiry::expire_sessions(&*self.store, self.cutoff(now))?;

        let session =
            PresenceSession::new(session_id.clone(), now, client.ip_address, client.user_agent);
        let created = self.store.upsert_session(&session)?;

        if created {
            tracing::info!(session_id = %session_id, "New visitor session");
        } else {
            tracing::debug!(session_id = %session_id, "Refreshed visitor session");
        }

        Ok(HeartbeatAck {
            session_id: session.session_id,
            new_session: created,
            last_activity: now,
        })
    }

    async fn record_visit(&self, counters_id: &CountersId) -> Result<VisitorStats> {
        let now = self.clock.now();
        let offset = self.config.day_offset();
        let online = expiry::reconcile_online(&*self.store, self.cutoff(now))?;

        let mut overflowed = false;
        let counters = self
            .store
            .update_counters(counters_id, &mut |counters: &mut VisitorCounters| {
                daily::roll_over(counters, now, offset);

                let (Some(total), Some(today)) = (
                    counters.total_visitors.checked_add(1),
                    counters.today_visitors.checked_add(1),
                ) else {
                    overflowed = true;
                    return false;
                };

                counters.total_visitors = total;
                counters.today_visitors = today;
                counters.online_users = online;
                counters.last_updated = now;
                true
            })?
            .ok_or(PresenceError::CountersNotFound(*counters_id))?;

        if overflowed {
            return Err(overflow(counters_id));
        }

        tracing::info!(
            counters_id = %counters_id,
            total = counters.total_visitors,
            today = counters.today_visitors,
            online,
            "Recorded visit"
        );

        Ok(VisitorStats::from_counters(&counters, online))
    }

    async fn get_stats(&self) -> Result<VisitorStats> {
        let now = self.clock.now();
        let offset = self.config.day_offset();

        let online = expiry::reconcile_online(&*self.store, self.cutoff(now))?;
        let counters_id = self.ensure_counters(now)?;

        // Only the daily reset and the online cache are written here; the
        // visit totals come from the stored copy, never from an earlier read.
        let counters = self
            .store
            .update_counters(&counters_id, &mut |counters: &mut VisitorCounters| {
                let mut dirty = daily::roll_over(counters, now, offset);
                if counters.online_users != online {
                    counters.online_users = online;
                    counters.last_updated = now;
                    dirty = true;
                }
                dirty
            })?
            .ok_or(PresenceError::CountersNotFound(counters_id))?;

        Ok(VisitorStats::from_counters(&counters, online))
    }

    async fn sweep_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        expiry::expire_sessions(&*self.store, self.cutoff(now))
    }
}
