//! Background eviction of stale visitor sessions.
//!
//! Expiry already happens lazily on every request; the sweep only keeps the
//! session table small when traffic is quiet.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use sitepulse_presence::PresenceTracker;

/// Spawn a task that calls `sweep_expired` every `interval`.
///
/// Failures are logged and the loop keeps going. The task runs until the
/// returned handle is aborted or the runtime shuts down.
pub fn spawn_expiry_sweep<P>(presence: Arc<P>, interval: Duration) -> JoinHandle<()>
where
    P: PresenceTracker + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match presence.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Expired stale visitor sessions"),
                Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sitepulse_core::{ManualClock, VisitorSessionId};
    use sitepulse_presence::{ClientInfo, PresenceConfig, PresenceService};
    use sitepulse_store::{RocksStore, Store};
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_stale_sessions() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        ));
        let presence = Arc::new(PresenceService::with_clock(
            Arc::clone(&store),
            PresenceConfig::default(),
            Arc::clone(&clock),
        ));

        let id = VisitorSessionId::parse("idle-visitor").unwrap();
        presence.heartbeat(&id, ClientInfo::default()).await.unwrap();
        assert!(store.get_session(&id).unwrap().is_some());

        clock.advance(chrono::Duration::minutes(4));
        let handle = spawn_expiry_sweep(Arc::clone(&presence), Duration::from_secs(60));

        // The first tick fires immediately
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(store.get_session(&id).unwrap().is_none());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_keeps_live_sessions() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        ));
        let presence = Arc::new(PresenceService::with_clock(
            Arc::clone(&store),
            PresenceConfig::default(),
            Arc::clone(&clock),
        ));

        let id = VisitorSessionId::parse("active-visitor").unwrap();
        presence.heartbeat(&id, ClientInfo::default()).await.unwrap();

        clock.advance(chrono::Duration::seconds(30));
        let handle = spawn_expiry_sweep(Arc::clone(&presence), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(130)).await;

        assert!(store.get_session(&id).unwrap().is_some());
        handle.abort();
    }
}
