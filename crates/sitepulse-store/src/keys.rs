//! Key encoding utilities for `RocksDB`.
//!
//! Activity index keys start with an order-preserving encoding of the
//! session's `last_activity` in milliseconds, so a forward scan visits
//! sessions from the stalest to the freshest.

use chrono::{DateTime, Utc};
use sitepulse_core::{CountersId, VisitorSessionId};

/// Width of the encoded timestamp prefix.
pub const TIMESTAMP_LEN: usize = 8;

/// Encode a session key (just the token bytes).
#[must_use]
pub fn session_key(session_id: &VisitorSessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Encode a timestamp as 8 big-endian bytes that sort in time order.
///
/// Milliseconds since the epoch with the sign bit flipped, so pre-epoch
/// values still sort before post-epoch ones.
#[must_use]
pub fn encode_timestamp(ts: DateTime<Utc>) -> [u8; TIMESTAMP_LEN] {
    #[allow(clippy::cast_sign_loss)]
    let ordered = (ts.timestamp_millis() as u64) ^ (1 << 63);
    ordered.to_be_bytes()
}

/// Encode an activity index key: `last_activity || token`.
#[must_use]
pub fn activity_key(last_activity: DateTime<Utc>, session_id: &VisitorSessionId) -> Vec<u8> {
    let token = session_id.as_bytes();
    let mut key = Vec::with_capacity(TIMESTAMP_LEN + token.len());
    key.extend_from_slice(&encode_timestamp(last_activity));
    key.extend_from_slice(token);
    key
}

/// Encode the lower bound for scanning sessions active at or after `since`.
#[must_use]
pub fn activity_bound(since: DateTime<Utc>) -> Vec<u8> {
    encode_timestamp(since).to_vec()
}

/// Split an activity index key into its timestamp prefix and session key.
///
/// Returns `None` if the key is shorter than the timestamp prefix.
#[must_use]
pub fn split_activity_key(key: &[u8]) -> Option<([u8; TIMESTAMP_LEN], &[u8])> {
    if key.len() < TIMESTAMP_LEN {
        return None;
    }
    let (ts, token) = key.split_at(TIMESTAMP_LEN);
    let mut prefix = [0u8; TIMESTAMP_LEN];
    prefix.copy_from_slice(ts);
    Some((prefix, token))
}

/// Encode a counters key (just the UUID bytes).
#[must_use]
pub fn counters_key(counters_id: &CountersId) -> Vec<u8> {
    counters_id.as_bytes().to_vec()
}
