//! Domain types stored in the database.
//!
//! These types represent the persisted presence sessions and the aggregate
//! visitor counters row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitepulse_core::{CountersId, VisitorSessionId};

/// A visitor presence record, refreshed by heartbeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSession {
    /// Client-generated session token.
    pub session_id: VisitorSessionId,
    /// When the first heartbeat for this token was seen.
    pub first_seen_at: DateTime<Utc>,
    /// Time of the most recent heartbeat.
    pub last_activity: DateTime<Utc>,
    /// Client IP address, diagnostic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent, diagnostic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl PresenceSession {
    /// Create a session whose first and last activity are both `now`.
    #[must_use]
    pub fn new(
        session_id: VisitorSessionId,
        now: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            session_id,
            first_seen_at: now,
            last_activity: now,
            ip_address,
            user_agent,
        }
    }
}

/// The aggregate visitor counters row.
///
/// `online_users` is only a cache of the last computed online count; readers
/// always recompute it from live sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorCounters {
    /// Row identifier.
    pub counters_id: CountersId,
    /// Lifetime number of recorded visits.
    pub total_visitors: u64,
    /// Visits recorded since the start of the current local day.
    pub today_visitors: u64,
    /// Cached online count, not authoritative.
    pub online_users: u64,
    /// Time of the last mutation of this row.
    pub last_updated: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl VisitorCounters {
    /// Create a zeroed counters row.
    #[must_use]
    pub fn zeroed(counters_id: CountersId, now: DateTime<Utc>) -> Self {
        Self {
            counters_id,
            total_visitors: 0,
            today_visitors: 0,
            online_users: 0,
            last_updated: now,
            created_at: now,
        }
    }
}
