//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use sitepulse_core::{CountersId, VisitorSessionId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{PresenceSession, VisitorCounters};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes session writes so the activity index always mirrors the
    /// primary records.
    session_lock: Mutex<()>,
    /// Serializes counters read-modify-write cycles.
    counters_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            session_lock: Mutex::new(()),
            counters_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Write a counters row. Callers hold `counters_lock`.
    fn write_counters(&self, counters: &VisitorCounters) -> Result<()> {
        let cf = self.cf(cf::COUNTERS)?;
        let key = keys::counters_key(&counters.counters_id);
        let value = Self::serialize(counters)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Merge an incoming heartbeat into the stored record.
    fn merge_session(existing: PresenceSession, incoming: &PresenceSession) -> PresenceSession {
        PresenceSession {
            session_id: existing.session_id,
            first_seen_at: existing.first_seen_at,
            last_activity: existing.last_activity.max(incoming.last_activity),
            ip_address: incoming.ip_address.clone().or(existing.ip_address),
            user_agent: incoming.user_agent.clone().or(existing.user_agent),
        }
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    fn upsert_session(&self, session: &PresenceSession) -> Result<bool> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_activity = self.cf(cf::SESSIONS_BY_ACTIVITY)?;
        let session_key = keys::session_key(&session.session_id);

        let _guard = self.session_lock.lock();

        let existing = self
            .db
            .get_cf(&cf_sessions, &session_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<PresenceSession>(&data))
            .transpose()?;

        let mut batch = WriteBatch::default();

        let (record, created) = match existing {
            Some(old) => {
                let old_index_key = keys::activity_key(old.last_activity, &old.session_id);
                let merged = Self::merge_session(old, session);
                let new_index_key = keys::activity_key(merged.last_activity, &merged.session_id);
                if old_index_key != new_index_key {
                    batch.delete_cf(&cf_by_activity, &old_index_key);
                }
                (merged, false)
            }
            None => (session.clone(), true),
        };

        let value = Self::serialize(&record)?;
        batch.put_cf(&cf_sessions, &session_key, &value);
        batch.put_cf(
            &cf_by_activity,
            keys::activity_key(record.last_activity, &record.session_id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(created)
    }

    fn get_session(&self, session_id: &VisitorSessionId) -> Result<Option<PresenceSession>> {
        let cf = self.cf(cf::SESSIONS)?;
        let key = keys::session_key(session_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_sessions_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_activity = self.cf(cf::SESSIONS_BY_ACTIVITY)?;
        let bound = keys::activity_bound(cutoff);

        let _guard = self.session_lock.lock();

        let mut batch = WriteBatch::default();
        let mut removed = 0u64;

        for item in self.db.iterator_cf(&cf_by_activity, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // Index is time-ordered; everything from here on is still live
            if &key[..] >= bound.as_slice() {
                break;
            }

            batch.delete_cf(&cf_by_activity, &key);
            if let Some((_, session_key)) = keys::split_activity_key(&key) {
                batch.delete_cf(&cf_sessions, session_key);
                removed += 1;
            }
        }

        if removed > 0 {
            self.db
                .write(batch)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            tracing::debug!(removed, cutoff = %cutoff, "Deleted inactive sessions");
        }

        Ok(removed)
    }

    fn count_sessions_active_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let cf_by_activity = self.cf(cf::SESSIONS_BY_ACTIVITY)?;
        let bound = keys::activity_bound(since);

        let mut count = 0u64;
        let iter = self
            .db
            .iterator_cf(&cf_by_activity, IteratorMode::From(&bound, Direction::Forward));

        for item in iter {
            item.map_err(|e| StoreError::Database(e.to_string()))?;
            count += 1;
        }

        Ok(count)
    }

    // =========================================================================
    // Counters Operations
    // =========================================================================

    fn put_counters(&self, counters: &VisitorCounters) -> Result<()> {
        let _guard = self.counters_lock.lock();
        self.write_counters(counters)
    }

    fn update_counters(
        &self,
        counters_id: &CountersId,
        update: &mut dyn FnMut(&mut VisitorCounters) -> bool,
    ) -> Result<Option<VisitorCounters>> {
        let _guard = self.counters_lock.lock();

        let Some(mut counters) = self.get_counters(counters_id)? else {
            return Ok(None);
        };

        if update(&mut counters) {
            self.write_counters(&counters)?;
        }

        Ok(Some(counters))
    }

    fn get_counters(&self, counters_id: &CountersId) -> Result<Option<VisitorCounters>> {
        let cf = self.cf(cf::COUNTERS)?;
        let key = keys::counters_key(counters_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn latest_counters(&self) -> Result<Option<VisitorCounters>> {
        let cf = self.cf(cf::COUNTERS)?;

        let mut latest: Option<VisitorCounters> = None;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let counters: VisitorCounters = Self::deserialize(&value)?;

            let newer = latest
                .as_ref()
                .map_or(true, |current| counters.last_updated > current.last_updated);
            if newer {
                latest = Some(counters);
            }
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn session(token: &str, at: DateTime<Utc>) -> PresenceSession {
        PresenceSession::new(VisitorSessionId::parse(token).unwrap(), at, None, None)
    }

    #[test]
    fn upsert_creates_then_refreshes() {
        let (store, _dir) = create_test_store();
        let id = VisitorSessionId::parse("abc").unwrap();

        let first = PresenceSession::new(
            id.clone(),
            t0(),
            Some("10.0.0.1".to_string()),
            Some("Mozilla/5.0".to_string()),
        );
        assert!(store.upsert_session(&first).unwrap());

        let later = t0() + Duration::seconds(20);
        assert!(!store.upsert_session(&session("abc", later)).unwrap());

        let stored = store.get_session(&id).unwrap().unwrap();
        assert_eq!(stored.first_seen_at, t0());
        assert_eq!(stored.last_activity, later);
        // Missing diagnostics on refresh keep the earlier values
        assert_eq!(stored.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(stored.user_agent.as_deref(), Some("Mozilla/5.0"));

        // Only one index entry survives the refresh
        assert_eq!(store.count_sessions_active_since(t0()).unwrap(), 1);
    }

    #[test]
    fn upsert_keeps_latest_activity() {
        let (store, _dir) = create_test_store();
        let later = t0() + Duration::seconds(40);

        store.upsert_session(&session("abc", later)).unwrap();
        // A delayed, older heartbeat must not move the session backwards
        store.upsert_session(&session("abc", t0())).unwrap();

        let id = VisitorSessionId::parse("abc").unwrap();
        let stored = store.get_session(&id).unwrap().unwrap();
        assert_eq!(stored.last_activity, later);
        assert_eq!(store.count_sessions_active_since(later).unwrap(), 1);
    }

    #[test]
    fn count_respects_cutoff() {
        let (store, _dir) = create_test_store();

        store.upsert_session(&session("old", t0())).unwrap();
        store
            .upsert_session(&session("mid", t0() + Duration::minutes(2)))
            .unwrap();
        store
            .upsert_session(&session("new", t0() + Duration::minutes(4)))
            .unwrap();

        assert_eq!(store.count_sessions_active_since(t0()).unwrap(), 3);
        assert_eq!(
            store
                .count_sessions_active_since(t0() + Duration::minutes(2))
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_sessions_active_since(t0() + Duration::minutes(5))
                .unwrap(),
            0
        );
    }

    #[test]
    fn delete_inactive_removes_records_and_index() {
        let (store, _dir) = create_test_store();

        store.upsert_session(&session("stale-1", t0())).unwrap();
        store
            .upsert_session(&session("stale-2", t0() + Duration::seconds(10)))
            .unwrap();
        store
            .upsert_session(&session("live", t0() + Duration::minutes(3)))
            .unwrap();

        let cutoff = t0() + Duration::minutes(3);
        assert_eq!(store.delete_sessions_inactive_before(cutoff).unwrap(), 2);

        let stale = VisitorSessionId::parse("stale-1").unwrap();
        assert!(store.get_session(&stale).unwrap().is_none());
        let live = VisitorSessionId::parse("live").unwrap();
        assert!(store.get_session(&live).unwrap().is_some());

        // Boundary: a session exactly at the cutoff is kept
        assert_eq!(store.count_sessions_active_since(t0()).unwrap(), 1);
        assert_eq!(store.delete_sessions_inactive_before(cutoff).unwrap(), 0);
    }

    #[test]
    fn sub_millisecond_activity_shares_the_cutoff_millisecond() {
        let (store, _dir) = create_test_store();

        // Same millisecond as the cutoff but 500us older: still counted
        let cutoff = t0() + Duration::microseconds(700);
        store
            .upsert_session(&session("same-ms", t0() + Duration::microseconds(200)))
            .unwrap();
        // Previous millisecond: stale
        store
            .upsert_session(&session("prev-ms", t0() - Duration::microseconds(300)))
            .unwrap();

        assert_eq!(store.count_sessions_active_since(cutoff).unwrap(), 1);
        assert_eq!(store.delete_sessions_inactive_before(cutoff).unwrap(), 1);

        let kept = VisitorSessionId::parse("same-ms").unwrap();
        assert!(store.get_session(&kept).unwrap().is_some());
        let dropped = VisitorSessionId::parse("prev-ms").unwrap();
        assert!(store.get_session(&dropped).unwrap().is_none());
    }

    #[test]
    fn counters_crud() {
        let (store, _dir) = create_test_store();
        assert!(store.latest_counters().unwrap().is_none());

        let mut counters = VisitorCounters::zeroed(CountersId::generate(), t0());
        store.put_counters(&counters).unwrap();

        counters.total_visitors = 5;
        counters.today_visitors = 2;
        store.put_counters(&counters).unwrap();

        let retrieved = store.get_counters(&counters.counters_id).unwrap().unwrap();
        assert_eq!(retrieved, counters);

        assert!(store
            .get_counters(&CountersId::generate())
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_counters_applies_to_stored_copy() {
        let (store, _dir) = create_test_store();
        assert!(store
            .update_counters(&CountersId::generate(), &mut |_: &mut VisitorCounters| true)
            .unwrap()
            .is_none());

        let mut counters = VisitorCounters::zeroed(CountersId::generate(), t0());
        store.put_counters(&counters).unwrap();

        // A stale in-memory copy does not leak into the update
        counters.total_visitors = 99;
        let updated = store
            .update_counters(&counters.counters_id, &mut |row: &mut VisitorCounters| {
                row.online_users = 3;
                true
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.total_visitors, 0);
        assert_eq!(updated.online_users, 3);

        // Returning false skips the write
        let skipped = store
            .update_counters(&counters.counters_id, &mut |row: &mut VisitorCounters| {
                row.total_visitors = 7;
                false
            })
            .unwrap()
            .unwrap();
        assert_eq!(skipped.total_visitors, 7);

        let stored = store.get_counters(&counters.counters_id).unwrap().unwrap();
        assert_eq!(stored.total_visitors, 0);
        assert_eq!(stored.online_users, 3);
    }

    #[test]
    fn latest_counters_picks_most_recent() {
        let (store, _dir) = create_test_store();

        let older = VisitorCounters::zeroed(CountersId::generate(), t0());
        let newer = VisitorCounters::zeroed(CountersId::generate(), t0() + Duration::hours(1));
        store.put_counters(&newer).unwrap();
        store.put_counters(&older).unwrap();

        let latest = store.latest_counters().unwrap().unwrap();
        assert_eq!(latest.counters_id, newer.counters_id);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let counters = VisitorCounters::zeroed(CountersId::generate(), t0());
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.upsert_session(&session("abc", t0())).unwrap();
            store.put_counters(&counters).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        assert_eq!(store.count_sessions_active_since(t0()).unwrap(), 1);
        assert!(store.get_counters(&counters.counters_id).unwrap().is_some());
    }
}
