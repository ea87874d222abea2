//! Timeout-based session expiry.
//!
//! There is no disconnect signal: a session is online while its last
//! heartbeat is within the timeout window, and is deleted lazily by the next
//! operation that looks.

use chrono::{DateTime, Duration, Utc};
use sitepulse_store::Store;

use crate::error::Result;

/// The oldest `last_activity` that still counts as online at `now`.
#[must_use]
pub fn online_cutoff(now: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(timeout)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete sessions that went quiet before the cutoff.
///
/// Returns the number of sessions removed.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn expire_sessions<S: Store + ?Sized>(store: &S, cutoff: DateTime<Utc>) -> Result<u64> {
    let removed = store.delete_sessions_inactive_before(cutoff)?;
    if removed > 0 {
        tracing::debug!(removed, cutoff = %cutoff, "Expired idle sessions");
    }
    Ok(removed)
}

/// Expire stale sessions, then count the ones that remain live.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn reconcile_online<S: Store + ?Sized>(store: &S, cutoff: DateTime<Utc>) -> Result<u64> {
    expire_sessions(store, cutoff)?;
    Ok(store.count_sessions_active_since(cutoff)?)
}
