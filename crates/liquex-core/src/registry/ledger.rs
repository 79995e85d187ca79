//! Notification suppression ledger.
//!
//! Each entry records when a notification key was last raised. An entry
//! suppresses repeats until its TTL has elapsed, after which it may be pruned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyLedger {
    entries: BTreeMap<String, i64>,
}

impl NotifyLedger {
    /// Key for a synthetic login, unique per user and login time
    pub fn login_key(username: &str, login_timestamp: i64) -> String {
        format!("login:{username}:{login_timestamp}")
    }

    /// Key for "external user logged in nearby"
    pub fn external_key(username: &str) -> String {
        format!("external:{username}")
    }

    /// Key for "external user detected" (separate cadence from logins)
    pub fn detected_key(username: &str) -> String {
        format!("detected:{username}")
    }

    /// Whether `key` was marked less than `ttl_ms` before `now_ms`
    pub fn is_suppressed(&self, key: &str, now_ms: i64, ttl_ms: i64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|marked_at| now_ms - marked_at < ttl_ms)
    }

    pub fn mark(&mut self, key: impl Into<String>, now_ms: i64) {
        self.entries.insert(key.into(), now_ms);
    }

    /// Drop entries that no longer suppress anything. Returns the number removed.
    pub fn prune(&mut self, now_ms: i64, ttl_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, marked_at| now_ms - *marked_at < ttl_ms);
        before - self.entries.len()
    }

    /// Fold in another ledger, keeping the later mark for each key
    pub fn merge(&mut self, other: &Self) {
        for (key, marked_at) in &other.entries {
            let entry = self.entries.entry(key.clone()).or_insert(*marked_at);
            *entry = (*entry).max(*marked_at);
        }
    }

    pub fn last_marked(&self, key: &str) -> Option<i64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_expires_after_ttl() {
        let mut ledger = NotifyLedger::default();
        let key = NotifyLedger::external_key("ExternalUser1");
        assert!(!ledger.is_suppressed(&key, 1_000, 300_000));

        ledger.mark(key.clone(), 1_000);
        assert!(ledger.is_suppressed(&key, 1_000 + 299_999, 300_000));
        assert!(!ledger.is_suppressed(&key, 1_000 + 300_000, 300_000));
    }

    #[test]
    fn merge_keeps_the_later_mark() {
        let mut stored = NotifyLedger::default();
        stored.mark("external:a", 100);
        stored.mark("external:b", 500);

        let mut local = NotifyLedger::default();
        local.mark("external:a", 300);
        local.mark("external:b", 200);
        local.mark("external:c", 50);

        stored.merge(&local);
        assert_eq!(stored.last_marked("external:a"), Some(300));
        assert_eq!(stored.last_marked("external:b"), Some(500));
        assert_eq!(stored.last_marked("external:c"), Some(50));
    }

    #[test]
    fn prune_removes_only_expired_entries() {
        let mut ledger = NotifyLedger::default();
        ledger.mark("old", 0);
        ledger.mark("fresh", 250_000);

        assert_eq!(ledger.prune(300_000, 300_000), 1);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.last_marked("fresh"), Some(250_000));
        assert_eq!(ledger.last_marked("old"), None);
    }

    #[test]
    fn login_keys_differ_per_login_time() {
        assert_ne!(
            NotifyLedger::login_key("Jane Smith", 1),
            NotifyLedger::login_key("Jane Smith", 2)
        );
    }
}
