//! Periodic Flush Task
//!
//! Background task that persists the memory table to disk whenever it has
//! unsaved mutations. Runs on a fixed interval; a tick with a clean table
//! is a no-op. On shutdown the task performs one final best-effort flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, MemoryTable};
use crate::persist::PersistenceManager;

/// Spawns the background flush task.
///
/// Each tick checks the table's dirty state; if dirty, it snapshots the
/// table and saves on the blocking pool so the timer loop (and every
/// caller) stays off disk I/O. A failed save leaves the table dirty and is
/// retried on the next tick.
///
/// The task exits when `shutdown` is signalled (or its sender dropped),
/// after a final best-effort flush.
///
/// # Arguments
/// * `table` - Shared memory table
/// * `persist` - Persistence manager owning the cache file
/// * `stats` - Shared counters for save bookkeeping
/// * `flush_interval` - Time between flush ticks
/// * `shutdown` - Watch channel signalling shutdown
pub fn spawn_flush_task(
    table: Arc<MemoryTable>,
    persist: Arc<PersistenceManager>,
    stats: Arc<CacheStats>,
    flush_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting flush task with interval {:?}", flush_interval);

        let mut ticker = tokio::time::interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the loop
        // waits a full interval before the first flush check
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    flush_if_dirty(&table, &persist, &stats).await;
                }
                _ = shutdown.changed() => {
                    flush_if_dirty(&table, &persist, &stats).await;
                    break;
                }
            }
        }

        info!("Flush task stopped");
    })
}

/// Checkpoints the table if it has unsaved mutations.
///
/// The whole snapshot-save-mark cycle runs on the blocking pool as one
/// [`PersistenceManager::checkpoint`] call, which serializes it against any
/// caller-driven save on the same manager.
async fn flush_if_dirty(
    table: &Arc<MemoryTable>,
    persist: &Arc<PersistenceManager>,
    stats: &Arc<CacheStats>,
) {
    if !table.is_dirty() {
        debug!("Flush tick: table clean, skipping");
        return;
    }

    let table = Arc::clone(table);
    let persist = Arc::clone(persist);
    match tokio::task::spawn_blocking(move || persist.checkpoint(&table)).await {
        Ok(Ok(count)) => {
            stats.record_save();
            info!("Flushed {} entries", count);
        }
        Ok(Err(e)) => {
            stats.record_save_failure();
            warn!("Flush failed, will retry next tick: {}", e);
        }
        Err(e) => {
            stats.record_save_failure();
            warn!("Flush task panicked during save: {}", e);
        }
    }
}
