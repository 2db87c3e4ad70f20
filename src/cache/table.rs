//! Memory Table Module
//!
//! The in-memory key/value table shared by all callers and the background
//! flush task. Values are the opaque byte sequences produced by the codec;
//! the table never inspects them.
//!
//! # Dirty Tracking
//! Instead of a single boolean, the table keeps two counters: a mutation
//! version bumped on every write, and the version last persisted. The table
//! is dirty whenever they differ. A save cycle snapshots `(entries,
//! version)`, persists the entries and then marks that version saved - a
//! put landing after the snapshot bumps the version past it, so the table
//! stays dirty and the next tick captures the late entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::order::WriteOrder;

// == Table Inner ==
/// Map and write order, guarded together so they never diverge.
#[derive(Debug, Default)]
struct TableInner {
    entries: HashMap<String, Vec<u8>>,
    order: WriteOrder,
}

// == Memory Table ==
/// Concurrent key -> bytes mapping with version-based dirty tracking and an
/// optional entry bound.
#[derive(Debug)]
pub struct MemoryTable {
    inner: RwLock<TableInner>,
    /// Bumped under the write lock on every mutation
    version: AtomicU64,
    /// Highest version known to be persisted
    saved_version: AtomicU64,
    /// Maximum number of entries (None = unbounded)
    max_entries: Option<usize>,
}

impl MemoryTable {
    // == Constructor ==
    /// Creates an empty table with an optional entry bound.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(TableInner::default()),
            version: AtomicU64::new(0),
            saved_version: AtomicU64::new(0),
            max_entries,
        }
    }

    // == Get ==
    /// Returns a copy of the raw bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.read_inner().entries.get(key).cloned()
    }

    // == Insert ==
    /// Stores raw bytes under `key`, overwriting any previous value and
    /// marking the table dirty.
    ///
    /// If the table is at its bound and `key` is new, the least recently
    /// written key is dropped silently.
    pub fn insert(&self, key: String, value: Vec<u8>) {
        let mut inner = self.write_inner();

        let is_new = !inner.entries.contains_key(&key);
        if is_new {
            if let Some(max) = self.max_entries {
                if inner.entries.len() >= max {
                    if let Some(victim) = inner.order.evict_oldest() {
                        inner.entries.remove(&victim);
                        debug!("Evicted entry {} to stay within bound of {}", victim, max);
                    }
                }
            }
        }

        inner.entries.insert(key.clone(), value);
        inner.order.touch(&key);

        // Bumped while still holding the write lock: a snapshot that saw
        // this entry necessarily reads an equal or later version
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    // == Hydrate ==
    /// Bulk-inserts entries loaded from disk at startup.
    ///
    /// Does not mark the table dirty - the table matches the file it was
    /// just loaded from. Entries beyond the bound are dropped oldest-first.
    pub fn hydrate(&self, entries: Vec<(String, Vec<u8>)>) {
        let mut inner = self.write_inner();
        for (key, value) in entries {
            inner.order.touch(&key);
            inner.entries.insert(key, value);
        }
        if let Some(max) = self.max_entries {
            while inner.entries.len() > max {
                match inner.order.evict_oldest() {
                    Some(victim) => {
                        inner.entries.remove(&victim);
                    }
                    None => break,
                }
            }
        }
    }

    // == Snapshot ==
    /// Returns all entries sorted by key, plus the table version they
    /// reflect.
    ///
    /// The sort makes a saved file byte-deterministic for a given table
    /// state. The version is read while the shared lock is held, so it is
    /// consistent with the cloned entries.
    pub fn snapshot(&self) -> (Vec<(String, Vec<u8>)>, u64) {
        let inner = self.read_inner();
        let mut entries: Vec<(String, Vec<u8>)> = inner
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let version = self.version.load(Ordering::SeqCst);
        drop(inner);

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        (entries, version)
    }

    // == Mark Saved ==
    /// Records that a snapshot at `version` was persisted successfully.
    ///
    /// Only advances - a stale save completing out of order can never make
    /// a newer unsaved mutation look clean.
    pub fn mark_saved(&self, version: u64) {
        self.saved_version.fetch_max(version, Ordering::SeqCst);
    }

    // == Is Dirty ==
    /// True if the table has mutations not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.version.load(Ordering::SeqCst) != self.saved_version.load(Ordering::SeqCst)
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.read_inner().entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.read_inner().entries.is_empty()
    }

    // == Contains ==
    /// Checks whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.read_inner().entries.contains_key(key)
    }

    // == Lock Helpers ==
    // A poisoned lock still holds coherent data (entries are inserted
    // whole), so recover the guard rather than propagate the panic.
    fn read_inner(&self) -> RwLockReadGuard<'_, TableInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, TableInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
