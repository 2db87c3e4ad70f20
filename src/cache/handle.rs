//! Cache Handle Module
//!
//! The public facade: an explicit handle created once at application start
//! and passed to call sites. Owns the memory table, the persistence
//! manager and the background flush task's lifecycle.
//!
//! Get and put never touch the disk - persistence is fully decoupled and
//! happens on the flush task (or via an explicit [`Cache::force_save`]).

use std::fs;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::stats::{CacheStats, StatsSnapshot};
use super::table::MemoryTable;
use crate::codec::{self, Decoded};
use crate::config::Config;
use crate::error::Result;
use crate::persist::PersistenceManager;
use crate::tasks::spawn_flush_task;

// == Cache ==
/// Handle to a process-local cache persisted to a single file.
///
/// Construct with [`Cache::open`] inside a tokio runtime; the handle spawns
/// a background task that flushes unsaved mutations on a fixed interval.
/// Call [`Cache::close`] at shutdown for a final best-effort save;
/// dropping the handle without closing aborts the task instead.
#[derive(Debug)]
pub struct Cache {
    table: Arc<MemoryTable>,
    persist: Arc<PersistenceManager>,
    stats: Arc<CacheStats>,
    shutdown_tx: watch::Sender<bool>,
    flush_handle: Option<JoinHandle<()>>,
}

impl Cache {
    // == Open ==
    /// Loads the persisted file (if any) and starts the flush task.
    ///
    /// A missing file is a first run; a corrupt file is sacrificed with a
    /// warning. Neither blocks startup. Fails only if the cache file's
    /// parent directory cannot be created.
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.cache_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let persist = Arc::new(PersistenceManager::new(config.cache_file.clone()));
        let table = Arc::new(MemoryTable::new(config.max_entries));
        table.hydrate(persist.load());

        let stats = Arc::new(CacheStats::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let flush_handle = spawn_flush_task(
            Arc::clone(&table),
            Arc::clone(&persist),
            Arc::clone(&stats),
            config.flush_interval(),
            shutdown_rx,
        );

        info!(
            "Cache opened at {} with {} entries",
            persist.path().display(),
            table.len()
        );

        Ok(Self {
            table,
            persist,
            stats,
            shutdown_tx,
            flush_handle: Some(flush_handle),
        })
    }

    // == Get ==
    /// Retrieves the value cached under `key`, decoded as `T`.
    ///
    /// Returns `None` for an absent key, for an entry stored as a different
    /// type and for a malformed entry - callers treat all three as a cache
    /// miss. A mismatched or malformed entry is logged and left in place.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.table.get(key) {
            Some(bytes) => bytes,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        match codec::decode::<T>(&bytes) {
            Decoded::Value(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Decoded::TypeMismatch { expected, found } => {
                warn!(
                    "Entry {} stored as {} but requested as {}, treating as miss",
                    key, found, expected
                );
                self.stats.record_miss();
                None
            }
            Decoded::Malformed(e) => {
                warn!("Entry {} is malformed, treating as miss: {}", key, e);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Caches `value` under `key`, overwriting any previous entry and
    /// marking the table dirty.
    ///
    /// Best-effort: a value that cannot be serialized is logged and
    /// dropped, no error surfaces to the caller. Never blocks on disk I/O.
    ///
    /// The entry is tagged with `T` as written at the put site, so store
    /// and retrieve with the same owned type (a `String` put as `&str`
    /// reads back as a miss).
    pub fn put<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match codec::encode(value) {
            Ok(bytes) => self.table.insert(key, bytes),
            Err(e) => warn!("Dropping put for key {}: {}", key, e),
        }
    }

    // == Force Save ==
    /// Synchronously persists the current table, regardless of the flush
    /// schedule. The one operation where a persistence error reaches the
    /// caller. Serialized against the background flush task, so a save in
    /// flight there simply delays this one.
    pub fn force_save(&self) -> Result<()> {
        match self.persist.checkpoint(&self.table) {
            Ok(_) => {
                self.stats.record_save();
                Ok(())
            }
            Err(e) => {
                self.stats.record_save_failure();
                Err(e)
            }
        }
    }

    // == Close ==
    /// Stops the flush task, which performs a final best-effort save.
    pub async fn close(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.flush_handle.take() {
            if let Err(e) = handle.await {
                warn!("Flush task ended abnormally: {}", e);
            }
        }
        info!("Cache closed");
    }

    // == Introspection ==
    /// Returns a point-in-time view of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.table.len())
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Checks whether `key` has a cached entry (of any type).
    pub fn contains_key(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// True if the table has mutations not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.table.is_dirty()
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        // close() was not called: stop the task without a final save
        if let Some(handle) = self.flush_handle.take() {
            let _ = self.shutdown_tx.send(true);
            handle.abort();
        }
    }
}
