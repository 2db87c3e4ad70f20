//! Memocache - a process-local object cache with disk persistence
//!
//! Stores arbitrary serializable values keyed by a string fingerprint and
//! periodically flushes the table to a single on-disk file, so expensive
//! computations survive a process restart. The cache is best-effort: a value
//! that fails to encode is dropped, a stale or mismatched entry reads as a
//! miss, and a corrupt file is sacrificed rather than blocking startup.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod persist;
pub mod tasks;

pub use cache::{Cache, CacheStats, MemoryTable, StatsSnapshot};
pub use codec::Decoded;
pub use config::Config;
pub use error::{CacheError, Result};
pub use persist::PersistenceManager;
pub use tasks::spawn_flush_task;
