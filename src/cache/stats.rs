//! Cache Statistics Module
//!
//! Tracks cache performance metrics. Counters are atomic because callers
//! and the background flush task record events concurrently without taking
//! the table lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Shared counters updated by the cache handle and the flush task.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Gets that returned a decoded value
    hits: AtomicU64,
    /// Gets that returned absent (missing key, type mismatch or malformed)
    misses: AtomicU64,
    /// Successful saves (scheduled or forced)
    saves: AtomicU64,
    /// Saves that failed and left the table dirty for retry
    save_failures: AtomicU64,
    /// Wall-clock time of the last successful save
    last_save_at: Mutex<Option<DateTime<Utc>>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Save ==
    /// Increments the save counter and stamps the save time.
    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_save_at.lock() {
            *last = Some(Utc::now());
        }
    }

    // == Record Save Failure ==
    /// Increments the failed-save counter.
    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self, total_entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            total_entries,
            last_save_at: self.last_save_at.lock().ok().and_then(|guard| *guard),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of gets that returned absent
    pub misses: u64,
    /// Number of successful saves
    pub saves: u64,
    /// Number of failed saves
    pub save_failures: u64,
    /// Current number of entries in the table
    pub total_entries: usize,
    /// Time of the last successful save, if any
    pub last_save_at: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no gets have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
