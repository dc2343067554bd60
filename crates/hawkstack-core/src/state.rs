//! Nonce replay state.
//!
//! Provides the [`NonceStore`] capability and [`InMemoryNonceStore`], a
//! thread-safe implementation keyed by `(credential id, nonce)`. The store is
//! process-lifetime scoped; nothing is persisted.

use std::fmt;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::types::Timestamp;

/// A nonce accepted as fresh, retained until its timestamp leaves the skew window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    /// Credential identifier the nonce was presented with.
    pub id: String,
    /// The nonce value.
    pub nonce: String,
    /// The request timestamp carried alongside the nonce.
    pub ts: Timestamp,
}

impl NonceRecord {
    /// Create a new record.
    pub fn new(id: impl Into<String>, nonce: impl Into<String>, ts: Timestamp) -> Self {
        Self {
            id: id.into(),
            nonce: nonce.into(),
            ts,
        }
    }
}

/// Whether a record stamped `ts` has left a window of `window` seconds at `now`.
///
/// A request carrying `ts` can only pass the timestamp check while
/// `now <= ts + window`, so once this returns `true` the record can no longer
/// guard against anything.
#[must_use]
pub fn is_expired(ts: Timestamp, now: Timestamp, window: i64) -> bool {
    now > ts.saturating_add(window)
}

/// Storage for nonces seen within the skew window.
///
/// Implementations must make [`NonceStore::insert_if_absent`] atomic per
/// `(id, nonce)`: two concurrent calls with the same pair and a live window
/// must never both return `true`.
pub trait NonceStore: Send + Sync + fmt::Debug {
    /// Record `record` unless a live record for the same `(id, nonce)` exists.
    ///
    /// Expired records are replaced. Returns `true` if the record was stored.
    fn insert_if_absent(&self, record: NonceRecord, now: Timestamp, window: i64) -> bool;

    /// Purge every record that has expired at `now`. Returns the number removed.
    fn sweep(&self, now: Timestamp, window: i64) -> usize;

    /// Number of retained records, live or not yet swept.
    fn len(&self) -> usize;

    /// Whether the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all records.
    fn reset(&self);
}

/// Thread-safe, in-memory nonce store.
///
/// Uses `DashMap`, whose entry API locks the shard owning a key for the
/// duration of the check-and-insert.
///
/// # Examples
///
/// ```
/// use hawkstack_core::{InMemoryNonceStore, NonceRecord, NonceStore};
///
/// let store = InMemoryNonceStore::new();
/// assert!(store.insert_if_absent(NonceRecord::new("id", "n1", 1000), 1000, 60));
/// assert!(!store.insert_if_absent(NonceRecord::new("id", "n1", 1000), 1030, 60));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryNonceStore {
    inner: DashMap<(String, String), Timestamp>,
}

impl InMemoryNonceStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

impl NonceStore for InMemoryNonceStore {
    fn insert_if_absent(&self, record: NonceRecord, now: Timestamp, window: i64) -> bool {
        match self.inner.entry((record.id, record.nonce)) {
            Entry::Occupied(mut entry) => {
                if is_expired(*entry.get(), now, window) {
                    entry.insert(record.ts);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record.ts);
                true
            }
        }
    }

    fn sweep(&self, now: Timestamp, window: i64) -> usize {
        let mut removed = 0;
        self.inner.retain(|_, ts| {
            let keep = !is_expired(*ts, now, window);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn reset(&self) {
        self.inner.clear();
    }
}
