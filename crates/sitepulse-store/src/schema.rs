//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary presence session records, keyed by the visitor session token.
    pub const SESSIONS: &str = "sessions";

    /// Index: sessions by last activity, keyed by `last_activity_ms || token`.
    pub const SESSIONS_BY_ACTIVITY: &str = "sessions_by_activity";

    /// Aggregate visitor counters, keyed by `counters_id`.
    pub const COUNTERS: &str = "visitor_counters";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::SESSIONS, cf::SESSIONS_BY_ACTIVITY, cf::COUNTERS]
}
