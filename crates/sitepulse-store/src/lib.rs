//! `RocksDB` storage layer for sitepulse.
//!
//! This crate provides persistent storage for visitor presence sessions and
//! the aggregate visitor counters row using `RocksDB` with column families.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `sessions`: Presence session records, keyed by the visitor session token
//! - `sessions_by_activity`: Index ordered by `last_activity`, used to count
//!   live sessions and to delete expired ones with a range scan
//! - `visitor_counters`: Aggregate counters rows, keyed by `counters_id`
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use sitepulse_core::VisitorSessionId;
//! use sitepulse_store::{PresenceSession, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/sitepulse-db").unwrap();
//!
//! let now = Utc::now();
//! let session_id = VisitorSessionId::parse("visitor-1").unwrap();
//! store.upsert_session(&PresenceSession::new(session_id, now, None, None)).unwrap();
//!
//! let online = store.count_sessions_active_since(now - Duration::minutes(3)).unwrap();
//! assert_eq!(online, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{PresenceSession, VisitorCounters};

use chrono::{DateTime, Utc};
use sitepulse_core::{CountersId, VisitorSessionId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer so the presence service can be
/// exercised against any backend offering the same primitives.
pub trait Store: Send + Sync {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Insert a session, or refresh the existing record with the same token.
    ///
    /// On refresh, `first_seen_at` is kept, `last_activity` becomes the later
    /// of the stored and incoming values, and diagnostic fields are replaced
    /// only when the incoming value is present. The read and write happen
    /// atomically with respect to other session writes.
    ///
    /// Returns `true` if a new record was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn upsert_session(&self, session: &PresenceSession) -> Result<bool>;

    /// Get a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &VisitorSessionId) -> Result<Option<PresenceSession>>;

    /// Delete every session whose `last_activity` is strictly before `cutoff`.
    ///
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_sessions_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Count sessions whose `last_activity` is at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_sessions_active_since(&self, since: DateTime<Utc>) -> Result<u64>;

    // =========================================================================
    // Counters Operations
    // =========================================================================

    /// Insert or update a counters row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_counters(&self, counters: &VisitorCounters) -> Result<()>;

    /// Apply `update` to the current stored copy of a counters row.
    ///
    /// The read, the update and the write happen atomically with respect to
    /// other counters writes, so fields the closure leaves alone are never
    /// rolled back. The row is written only if `update` returns `true`.
    ///
    /// Returns the row after the update, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn update_counters(
        &self,
        counters_id: &CountersId,
        update: &mut dyn FnMut(&mut VisitorCounters) -> bool,
    ) -> Result<Option<VisitorCounters>>;

    /// Get a counters row by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_counters(&self, counters_id: &CountersId) -> Result<Option<VisitorCounters>>;

    /// Get the most recently updated counters row, if any exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn latest_counters(&self) -> Result<Option<VisitorCounters>>;
}
