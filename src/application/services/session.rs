//! Keyed store for multi-step per-user workflows
//!
//! The dispatch loop gives no session affinity, so anything that spans
//! several events lives here with an explicit expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Entries expire `ttl` after insertion and are dropped lazily or on purge
pub struct SessionStore<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V> SessionStore<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace the session for `key`, returning the previous live one
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut entries = self.lock();
        let previous = entries.insert(key, (Instant::now(), value));
        previous.and_then(|(at, v)| (at.elapsed() < self.ttl).then_some(v))
    }

    /// Remove and return the session if it has not expired
    pub fn take(&self, key: &K) -> Option<V> {
        let (at, value) = self.lock().remove(key)?;
        (at.elapsed() < self.ttl).then_some(value)
    }

    /// Remove the session only if `pred` holds for it
    pub fn take_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((_, v)) if pred(v) => {}
            _ => return None,
        }
        let (at, value) = entries.remove(key)?;
        (at.elapsed() < self.ttl).then_some(value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock()
            .get(key)
            .map(|(at, _)| at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (at, _)| at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, (Instant, V)>> {
        // A panic while holding the lock cannot leave a map half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_returns_live_session_once() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.insert(1_i64, "pending");
        assert!(store.contains(&1));
        assert_eq!(store.take(&1), Some("pending"));
        assert_eq!(store.take(&1), None);
    }

    #[test]
    fn test_expired_sessions_are_not_returned() {
        let store = SessionStore::new(Duration::ZERO);
        store.insert(1_i64, "stale");
        assert!(!store.contains(&1));
        assert_eq!(store.take(&1), None);
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new(Duration::ZERO);
        store.insert(1_i64, 'a');
        store.insert(2_i64, 'b');
        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_take_if_checks_predicate() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.insert(1_i64, 10);
        assert_eq!(store.take_if(&1, |v| *v == 11), None);
        assert_eq!(store.take_if(&1, |v| *v == 10), Some(10));
    }

    #[test]
    fn test_insert_replaces() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.insert(1_i64, 1), None);
        assert_eq!(store.insert(1_i64, 2), Some(1));
        assert_eq!(store.take(&1), Some(2));
    }
}
