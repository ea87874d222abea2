//! Request and response types for presence operations.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use sitepulse_core::{CountersId, VisitorSessionId};
use sitepulse_store::VisitorCounters;

/// Diagnostic details about the client sending a heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address, as seen by the gateway.
    pub ip_address: Option<String>,
    /// Client `User-Agent` header.
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Create client info from optional address and user agent.
    #[must_use]
    pub const fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Acknowledgement for a processed heartbeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatAck {
    /// The session that was refreshed.
    pub session_id: VisitorSessionId,
    /// True if no live session existed for this token, i.e. a new visit.
    pub new_session: bool,
    /// The activity time recorded for this heartbeat.
    pub last_activity: DateTime<Utc>,
}

/// Visitor counts as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorStats {
    /// The counters row these figures belong to.
    pub counters_id: CountersId,
    /// Lifetime visits.
    pub total_visitors: u64,
    /// Visits today (local day).
    pub today_visitors: u64,
    /// Sessions with a heartbeat inside the online timeout, computed at read time.
    pub online_users: u64,
}

impl VisitorStats {
    /// Build stats from a counters row and a freshly computed online count.
    #[must_use]
    pub const fn from_counters(counters: &VisitorCounters, online_users: u64) -> Self {
        Self {
            counters_id: counters.counters_id,
            total_visitors: counters.total_visitors,
            today_visitors: counters.today_visitors,
            online_users,
        }
    }
}

/// Configuration for the presence service.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Seconds without a heartbeat before a session stops counting as online.
    pub online_timeout_seconds: u64,
    /// Offset from UTC, in minutes, that defines the local calendar day for
    /// the daily counter reset.
    pub day_utc_offset_minutes: i32,
    /// Interval of the background expiry sweep in seconds; 0 disables it.
    pub sweep_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            online_timeout_seconds: 180, // 3 minutes
            day_utc_offset_minutes: 0,
            sweep_interval_seconds: 60,
        }
    }
}

impl PresenceConfig {
    /// Get the online timeout as a `chrono::Duration`.
    #[must_use]
    pub fn online_timeout(&self) -> chrono::Duration {
        let secs = i64::try_from(self.online_timeout_seconds).unwrap_or(i64::MAX / 1000);
        chrono::Duration::seconds(secs)
    }

    /// Get the offset that defines the local day.
    ///
    /// Offsets outside ±24h fall back to UTC.
    #[must_use]
    pub fn day_offset(&self) -> FixedOffset {
        self.day_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Get the sweep interval, or `None` when the sweep is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<std::time::Duration> {
        if self.sweep_interval_seconds == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.sweep_interval_seconds))
        }
    }
}
