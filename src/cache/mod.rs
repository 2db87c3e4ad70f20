//! Cache Module
//!
//! The in-memory table, the write-order tracker backing its entry bound,
//! statistics,
//! and the public [`Cache`] handle layered on top of them.

mod handle;
mod order;
mod stats;
mod table;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use handle::Cache;
pub use stats::{CacheStats, StatsSnapshot};
pub use table::MemoryTable;
