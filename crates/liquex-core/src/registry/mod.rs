//! Shared local registry.
//!
//! A typed view over a [`KeyValueStore`] holding everything the simulated
//! devices share: the global request list, the pending-update queue, recent
//! logins, suppression ledger, counters and logs. The registry is owned by the
//! app context and lent to the engines by `&mut`, so there is exactly one
//! writer per handle. Every read-modify-write runs as one
//! [`KeyValueStore::atomically`] unit, which keeps separate processes sharing
//! a database file from overwriting each other.
//!
//! Plain reads never fail: a missing, unreadable or corrupt key is logged and
//! treated as its empty value.

mod ledger;
mod store;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Rejection, Result};
use crate::models::{
    ExternalLoginRecord, PendingUpdate, RecentLogin, Request, RequestId, Transaction, Transfer,
    Update, UserRating,
};

pub use ledger::NotifyLedger;
pub use store::{KeyValueStore, MemoryStore};

/// Storage key names
pub mod keys {
    pub const GLOBAL_REQUESTS: &str = "liquex_global_requests";
    pub const BROADCAST: &str = "liquex_broadcast";
    pub const LAST_SYNC: &str = "liquex_last_sync";
    pub const PENDING_UPDATES: &str = "liquex_pending_updates";
    pub const RECENT_LOGINS: &str = "liquex_recent_logins";
    pub const NOTIFIED: &str = "liquex_notified";
    pub const LOCATION_COUNT: &str = "liquex_location_count";
    pub const EXTERNAL_LOGINS: &str = "liquex_external_user_logins";
    pub const PROXIMITY_TRANSFERS: &str = "liquex_proximity_transfers";
    pub const TRANSACTIONS: &str = "liquex_transactions";
    pub const RATINGS: &str = "liquex_ratings";
}

pub const DEFAULT_RECENT_LOGIN_CAPACITY: usize = 10;
pub const DEFAULT_EXTERNAL_LOGIN_CAPACITY: usize = 20;

/// Snapshot written on every save of the global list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub timestamp: i64,
    pub requests: Vec<Request>,
}

pub struct SharedRegistry<S> {
    store: S,
    recent_login_capacity: usize,
    external_login_capacity: usize,
}

impl<S: KeyValueStore> SharedRegistry<S> {
    pub const fn new(store: S) -> Self {
        Self::with_capacities(
            store,
            DEFAULT_RECENT_LOGIN_CAPACITY,
            DEFAULT_EXTERNAL_LOGIN_CAPACITY,
        )
    }

    pub const fn with_capacities(
        store: S,
        recent_login_capacity: usize,
        external_login_capacity: usize,
    ) -> Self {
        Self {
            store,
            recent_login_capacity,
            external_login_capacity,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Global request list
    // -----------------------------------------------------------------------

    pub fn all_requests(&self) -> Vec<Request> {
        self.read_json(keys::GLOBAL_REQUESTS)
    }

    pub fn request(&self, id: RequestId) -> Option<Request> {
        self.all_requests()
            .into_iter()
            .find(|request| request.id == id)
    }

    /// Persist the list and publish a broadcast snapshot
    pub fn save_all_requests(&mut self, requests: &[Request], now_ms: i64) -> Result<()> {
        self.store
            .atomically(|store| write_requests(store, requests, now_ms))
    }

    pub fn broadcast(&self) -> Option<Broadcast> {
        self.read_json::<Option<Broadcast>>(keys::BROADCAST)
    }

    /// Append a request and tell the other devices about it
    pub fn add_global_request(&mut self, request: Request, now_ms: i64) -> Result<()> {
        self.store.atomically(|store| {
            let mut requests: Vec<Request> = load_key(store, keys::GLOBAL_REQUESTS)?;
            if requests.iter().any(|existing| existing.id == request.id) {
                return Err(Rejection::DuplicateRequest(request.id.0).into());
            }
            requests.push(request.clone());
            write_requests(store, &requests, now_ms)?;
            push_update(store, PendingUpdate::new(Update::NewRequest(request), now_ms))
        })
    }

    /// Remove a request by id and tell the other devices. Returns whether it existed.
    pub fn remove_global_request(&mut self, id: RequestId, now_ms: i64) -> Result<bool> {
        self.store.atomically(|store| {
            let mut requests: Vec<Request> = load_key(store, keys::GLOBAL_REQUESTS)?;
            let before = requests.len();
            requests.retain(|request| request.id != id);
            let removed = requests.len() != before;
            write_requests(store, &requests, now_ms)?;
            push_update(store, PendingUpdate::removed(id, now_ms))?;
            Ok(removed)
        })
    }

    /// An id strictly above every stored one and no lower than `now_ms`
    pub fn next_request_id(&self, now_ms: i64) -> RequestId {
        let floor = u64::try_from(now_ms).unwrap_or(0);
        let above_existing = self
            .all_requests()
            .iter()
            .map(|request| request.id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        RequestId(floor.max(above_existing))
    }

    // -----------------------------------------------------------------------
    // Sync bookkeeping
    // -----------------------------------------------------------------------

    pub fn last_sync(&self) -> Option<i64> {
        self.read_json::<Option<i64>>(keys::LAST_SYNC)
    }

    pub fn set_last_sync(&mut self, now_ms: i64) -> Result<()> {
        self.write_json(keys::LAST_SYNC, &now_ms)
    }

    pub fn clear_last_sync(&mut self) -> Result<()> {
        self.store.remove(keys::LAST_SYNC)
    }

    pub fn enqueue_update(&mut self, update: PendingUpdate) -> Result<()> {
        self.store.atomically(|store| push_update(store, update))
    }

    /// Peek at the queue without draining it
    pub fn pending_updates(&self) -> Vec<PendingUpdate> {
        self.read_json(keys::PENDING_UPDATES)
    }

    /// Drain the queue and fold it into the global list as one unit.
    ///
    /// `apply` gets the stored list and the drained updates. The list and a
    /// new broadcast are written only if `apply` changed the list. When any
    /// step fails the queue keeps its updates.
    pub fn fold_pending_updates<R, F>(&mut self, now_ms: i64, apply: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Request>, &[PendingUpdate]) -> R,
    {
        self.store.atomically(|store| {
            let updates: Vec<PendingUpdate> = match store.take(keys::PENDING_UPDATES)? {
                Some(raw) => decode_or_default(keys::PENDING_UPDATES, &raw),
                None => Vec::new(),
            };
            let mut requests: Vec<Request> = load_key(store, keys::GLOBAL_REQUESTS)?;
            let before = requests.clone();
            let outcome = apply(&mut requests, &updates);
            if requests != before {
                write_requests(store, &requests, now_ms)?;
            }
            Ok(outcome)
        })
    }

    // -----------------------------------------------------------------------
    // Logins
    // -----------------------------------------------------------------------

    /// Append to the recent-login buffer, evicting the oldest entries past capacity
    pub fn record_login(&mut self, login: RecentLogin) -> Result<()> {
        let capacity = self.recent_login_capacity;
        self.update_json(keys::RECENT_LOGINS, |logins: &mut Vec<RecentLogin>| {
            logins.push(login);
            evict_oldest(logins, capacity);
            Ok(())
        })
    }

    pub fn all_logins(&self) -> Vec<RecentLogin> {
        self.read_json(keys::RECENT_LOGINS)
    }

    /// Logins younger than `window_ms`
    pub fn recent_logins(&self, now_ms: i64, window_ms: i64) -> Vec<RecentLogin> {
        self.all_logins()
            .into_iter()
            .filter(|login| now_ms - login.timestamp < window_ms)
            .collect()
    }

    pub fn record_external_login(&mut self, record: ExternalLoginRecord) -> Result<()> {
        let capacity = self.external_login_capacity;
        self.update_json(
            keys::EXTERNAL_LOGINS,
            |records: &mut Vec<ExternalLoginRecord>| {
                records.push(record);
                evict_oldest(records, capacity);
                Ok(())
            },
        )
    }

    pub fn external_logins(&self) -> Vec<ExternalLoginRecord> {
        self.read_json(keys::EXTERNAL_LOGINS)
    }

    // -----------------------------------------------------------------------
    // Notification ledger and counters
    // -----------------------------------------------------------------------

    pub fn notify_ledger(&self) -> NotifyLedger {
        self.read_json(keys::NOTIFIED)
    }

    /// Merge `ledger` into the stored one, then prune what has expired.
    /// Returns the number of entries pruned.
    pub fn save_notify_ledger(
        &mut self,
        ledger: &NotifyLedger,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Result<usize> {
        self.update_json(keys::NOTIFIED, |stored: &mut NotifyLedger| {
            stored.merge(ledger);
            Ok(stored.prune(now_ms, ttl_ms))
        })
    }

    pub fn location_count(&self) -> u64 {
        self.read_json(keys::LOCATION_COUNT)
    }

    pub fn increment_location_count(&mut self) -> Result<u64> {
        let count = self.update_json(keys::LOCATION_COUNT, |count: &mut u64| {
            *count = count.saturating_add(1);
            Ok(*count)
        })?;
        tracing::debug!("Location count increased to {count}");
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Transfers, history and ratings
    // -----------------------------------------------------------------------

    pub fn add_proximity_transfer(&mut self, transfer: Transfer) -> Result<()> {
        self.update_json(keys::PROXIMITY_TRANSFERS, |transfers: &mut Vec<Transfer>| {
            transfers.push(transfer);
            Ok(())
        })
    }

    pub fn proximity_transfers(&self) -> Vec<Transfer> {
        self.read_json(keys::PROXIMITY_TRANSFERS)
    }

    /// Append to the history. A clashing id gets a numeric suffix.
    pub fn append_transaction(&mut self, mut transaction: Transaction) -> Result<Transaction> {
        self.update_json(keys::TRANSACTIONS, |history: &mut Vec<Transaction>| {
            let base = transaction.id.clone();
            let mut suffix = 1;
            while history.iter().any(|existing| existing.id == transaction.id) {
                transaction.id = format!("{base}-{suffix}");
                suffix += 1;
            }
            history.push(transaction.clone());
            Ok(transaction)
        })
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.read_json(keys::TRANSACTIONS)
    }

    pub fn rate_user(&mut self, username: &str, rating: UserRating) -> Result<()> {
        if !(1..=5).contains(&rating.rating) {
            return Err(Rejection::InvalidRating(rating.rating).into());
        }
        self.update_json(
            keys::RATINGS,
            |ratings: &mut BTreeMap<String, Vec<UserRating>>| {
                ratings
                    .entry(username.to_string())
                    .or_default()
                    .push(rating);
                Ok(())
            },
        )
    }

    pub fn ratings_for(&self, username: &str) -> Vec<UserRating> {
        self.all_ratings().remove(username).unwrap_or_default()
    }

    /// Mean rating, or `None` when the user has never been rated
    pub fn average_rating(&self, username: &str) -> Option<f64> {
        let ratings = self.ratings_for(username);
        if ratings.is_empty() {
            return None;
        }
        let total: u32 = ratings.iter().map(|rating| u32::from(rating.rating)).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = ratings.len() as f64;
        Some(f64::from(total) / count)
    }

    fn all_ratings(&self) -> BTreeMap<String, Vec<UserRating>> {
        self.read_json(keys::RATINGS)
    }

    // -----------------------------------------------------------------------
    // Raw JSON helpers
    // -----------------------------------------------------------------------

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        load_key(&self.store, key).unwrap_or_else(|error| {
            tracing::warn!("Failed to read registry key {key}: {error}");
            T::default()
        })
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        write_key(&mut self.store, key, value)
    }

    /// Read-modify-write of one key as a single store unit
    fn update_json<T, R, F>(&mut self, key: &str, change: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        self.store.atomically(|store| {
            let mut value: T = load_key(store, key)?;
            let outcome = change(&mut value)?;
            write_key(store, key, &value)?;
            Ok(outcome)
        })
    }
}

/// Store errors propagate; a corrupt value decodes as empty
fn load_key<S: KeyValueStore, T: DeserializeOwned + Default>(store: &S, key: &str) -> Result<T> {
    Ok(store
        .get(key)?
        .map_or_else(T::default, |raw| decode_or_default(key, &raw)))
}

fn write_key<S: KeyValueStore, T: Serialize + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

fn write_requests<S: KeyValueStore>(store: &mut S, requests: &[Request], now_ms: i64) -> Result<()> {
    write_key(store, keys::GLOBAL_REQUESTS, requests)?;
    write_key(
        store,
        keys::BROADCAST,
        &Broadcast {
            timestamp: now_ms,
            requests: requests.to_vec(),
        },
    )
}

fn push_update<S: KeyValueStore>(store: &mut S, update: PendingUpdate) -> Result<()> {
    let mut updates: Vec<PendingUpdate> = load_key(store, keys::PENDING_UPDATES)?;
    updates.push(update);
    write_key(store, keys::PENDING_UPDATES, &updates)
}

fn decode_or_default<T: DeserializeOwned + Default>(key: &str, raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|error| {
        tracing::warn!("Ignoring corrupt registry key {key}: {error}");
        T::default()
    })
}

fn evict_oldest<T>(entries: &mut Vec<T>, capacity: usize) {
    if entries.len() > capacity {
        let excess = entries.len() - capacity;
        entries.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::fixtures::{Fixtures, DEMO_LOCATION};
    use crate::models::{TransactionKind, TransactionStatus};
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;

    fn setup() -> SharedRegistry<MemoryStore> {
        SharedRegistry::new(MemoryStore::new())
    }

    fn sample_request(id: u64) -> Request {
        let mut request = Fixtures::demo(NOW).sample_requests[0].clone();
        request.id = RequestId(id);
        request
    }

    fn login(username: &str, timestamp: i64) -> RecentLogin {
        RecentLogin {
            username: username.to_string(),
            location: DEMO_LOCATION,
            timestamp,
            device_id: format!("device_{timestamp}"),
        }
    }

    #[test]
    fn empty_store_reads_as_empty_collections() {
        let registry = setup();
        assert!(registry.all_requests().is_empty());
        assert!(registry.pending_updates().is_empty());
        assert!(registry.all_logins().is_empty());
        assert_eq!(registry.last_sync(), None);
        assert_eq!(registry.location_count(), 0);
        assert!(registry.notify_ledger().is_empty());
    }

    #[test]
    fn corrupt_keys_read_as_empty() {
        let mut registry = setup();
        for key in [
            keys::GLOBAL_REQUESTS,
            keys::PENDING_UPDATES,
            keys::RECENT_LOGINS,
            keys::LAST_SYNC,
            keys::LOCATION_COUNT,
        ] {
            registry.store_mut().set(key, "{not json").unwrap();
        }

        assert!(registry.all_requests().is_empty());
        assert!(registry.pending_updates().is_empty());
        assert!(registry.all_logins().is_empty());
        assert_eq!(registry.last_sync(), None);
        assert_eq!(registry.location_count(), 0);
    }

    #[test]
    fn add_global_request_saves_and_enqueues() {
        let mut registry = setup();
        registry.add_global_request(sample_request(7), NOW).unwrap();

        assert_eq!(registry.all_requests().len(), 1);
        let updates = registry.pending_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update.request_id(), RequestId(7));
        assert_eq!(registry.broadcast().map(|b| b.requests.len()), Some(1));
    }

    #[test]
    fn add_global_request_rejects_duplicate_id() {
        let mut registry = setup();
        registry.add_global_request(sample_request(7), NOW).unwrap();
        let error = registry
            .add_global_request(sample_request(7), NOW)
            .unwrap_err();
        assert_eq!(
            error.rejection(),
            Some(&Rejection::DuplicateRequest(7))
        );
        assert_eq!(registry.all_requests().len(), 1);
    }

    #[test]
    fn remove_global_request_reports_presence() {
        let mut registry = setup();
        registry.add_global_request(sample_request(7), NOW).unwrap();

        assert!(registry.remove_global_request(RequestId(7), NOW).unwrap());
        assert!(!registry.remove_global_request(RequestId(7), NOW).unwrap());
        assert!(registry.all_requests().is_empty());
        assert_eq!(registry.pending_updates().len(), 3);
    }

    #[test]
    fn fold_drains_the_queue_exactly_once() {
        let mut registry = setup();
        registry
            .enqueue_update(PendingUpdate::new(
                Update::NewRequest(sample_request(1)),
                NOW,
            ))
            .unwrap();
        registry
            .enqueue_update(PendingUpdate::removed(RequestId(2), NOW))
            .unwrap();

        let seen = registry
            .fold_pending_updates(NOW + 10, |requests, updates| {
                requests.push(sample_request(1));
                updates.iter().map(|u| u.update.request_id()).collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(seen, vec![RequestId(1), RequestId(2)]);
        assert!(registry.pending_updates().is_empty());
        assert_eq!(registry.all_requests().len(), 1);
        assert_eq!(registry.broadcast().map(|b| b.timestamp), Some(NOW + 10));

        let seen = registry
            .fold_pending_updates(NOW + 20, |_, updates| updates.len())
            .unwrap();
        assert_eq!(seen, 0);
        assert_eq!(registry.broadcast().map(|b| b.timestamp), Some(NOW + 10));
    }

    /// Refuses writes to one key; rolls back like a real store
    struct RefusingStore {
        inner: MemoryStore,
        refused_key: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key == self.refused_key {
                return Err(crate::error::Error::Config(format!("{key} is read-only")));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn atomically<T, F>(&mut self, f: F) -> Result<T>
        where
            F: FnOnce(&mut Self) -> Result<T>,
        {
            let snapshot = self.inner.clone();
            let result = f(self);
            if result.is_err() {
                self.inner = snapshot;
            }
            result
        }
    }

    #[test]
    fn failed_save_keeps_pending_updates() {
        let mut registry = SharedRegistry::new(RefusingStore {
            inner: MemoryStore::new(),
            refused_key: keys::GLOBAL_REQUESTS,
        });
        registry
            .enqueue_update(PendingUpdate::new(
                Update::NewRequest(sample_request(1)),
                NOW,
            ))
            .unwrap();

        let result = registry.fold_pending_updates(NOW, |requests, updates| {
            requests.push(sample_request(1));
            updates.len()
        });

        assert!(result.is_err());
        assert_eq!(registry.pending_updates().len(), 1);
        assert!(registry.all_requests().is_empty());
    }

    #[test]
    fn writers_on_separate_handles_lose_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("liquex.db");
        SqliteStore::open(&path).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..2_u64 {
                let path = &path;
                scope.spawn(move || {
                    let mut registry = SharedRegistry::new(SqliteStore::open(path).unwrap());
                    for index in 0..100 {
                        registry
                            .add_global_request(sample_request(worker * 1_000 + index), NOW)
                            .unwrap();
                    }
                });
            }
        });

        let registry = SharedRegistry::new(SqliteStore::open(&path).unwrap());
        assert_eq!(registry.all_requests().len(), 200);
        assert_eq!(registry.pending_updates().len(), 200);
        assert_eq!(registry.broadcast().map(|b| b.requests.len()), Some(200));
    }

    #[test]
    fn ledger_saves_merge_with_stored_marks() {
        let mut registry = setup();
        let mut first = NotifyLedger::default();
        first.mark("external:a", NOW);
        registry.save_notify_ledger(&first, NOW, 300_000).unwrap();

        let mut second = NotifyLedger::default();
        second.mark("external:b", NOW + 1);
        second.mark("external:old", NOW - 400_000);
        let pruned = registry.save_notify_ledger(&second, NOW + 1, 300_000).unwrap();

        let stored = registry.notify_ledger();
        assert_eq!(pruned, 1);
        assert_eq!(stored.last_marked("external:a"), Some(NOW));
        assert_eq!(stored.last_marked("external:b"), Some(NOW + 1));
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn next_request_id_is_unique_and_monotonic() {
        let mut registry = setup();
        assert_eq!(registry.next_request_id(NOW), RequestId(1_700_000_000_000));

        registry
            .add_global_request(sample_request(1_700_000_000_500), NOW)
            .unwrap();
        assert_eq!(registry.next_request_id(NOW), RequestId(1_700_000_000_501));
        assert_eq!(registry.next_request_id(-5), RequestId(1_700_000_000_501));
    }

    #[test]
    fn recent_login_buffer_evicts_oldest_first() {
        let mut registry = setup();
        for index in 0..13 {
            registry
                .record_login(login(&format!("user{index}"), NOW + index))
                .unwrap();
        }

        let logins = registry.all_logins();
        assert_eq!(logins.len(), 10);
        assert_eq!(logins[0].username, "user3");
        assert_eq!(logins[9].username, "user12");
    }

    #[test]
    fn recent_logins_filters_by_window() {
        let mut registry = setup();
        registry.record_login(login("old", NOW - 400_000)).unwrap();
        registry.record_login(login("new", NOW - 1_000)).unwrap();

        let recent = registry.recent_logins(NOW, 300_000);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].username, "new");
    }

    #[test]
    fn external_login_log_is_capped() {
        let mut registry = setup();
        let fixtures = Fixtures::demo(NOW);
        for index in 0..25 {
            registry
                .record_external_login(ExternalLoginRecord::sighting(
                    &fixtures.external_users[0],
                    150.0,
                    NOW + index,
                ))
                .unwrap();
        }
        let log = registry.external_logins();
        assert_eq!(log.len(), 20);
        assert_eq!(log[0].timestamp, NOW + 5);
    }

    #[test]
    fn location_count_increments_and_persists() {
        let mut registry = setup();
        assert_eq!(registry.increment_location_count().unwrap(), 1);
        assert_eq!(registry.increment_location_count().unwrap(), 2);
        assert_eq!(registry.location_count(), 2);
    }

    #[test]
    fn append_transaction_keeps_ids_unique() {
        let mut registry = setup();
        let transaction = Transaction {
            id: Transaction::id_for(NOW),
            amount: 10.0,
            kind: TransactionKind::Money,
            requester: "John Doe".to_string(),
            responder: "demo".to_string(),
            status: TransactionStatus::Completed,
            timestamp: NOW,
            rating: None,
        };

        let first = registry.append_transaction(transaction.clone()).unwrap();
        let second = registry.append_transaction(transaction).unwrap();
        assert_eq!(first.id, format!("TXN{NOW}"));
        assert_eq!(second.id, format!("TXN{NOW}-1"));
        assert_eq!(registry.transactions().len(), 2);
    }

    #[test]
    fn ratings_validate_range_and_average() {
        let mut registry = setup();
        let rating = |value| UserRating {
            rating: value,
            comment: String::new(),
            timestamp: NOW,
            rater: "demo".to_string(),
        };

        assert_eq!(registry.average_rating("Jane Smith"), None);
        registry.rate_user("Jane Smith", rating(5)).unwrap();
        registry.rate_user("Jane Smith", rating(4)).unwrap();
        assert_eq!(registry.average_rating("Jane Smith"), Some(4.5));

        let error = registry.rate_user("Jane Smith", rating(6)).unwrap_err();
        assert_eq!(error.rejection(), Some(&Rejection::InvalidRating(6)));
    }
}
