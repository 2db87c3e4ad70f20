//! Configuration Module
//!
//! Holds the cache file location and the flush/eviction tunables. The host
//! application resolves the storage directory; everything else has sensible
//! defaults that can be overridden via environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between flush ticks, in seconds.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 10;

/// Cache configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted cache file (e.g. `<data_dir>/cache.dat`)
    pub cache_file: PathBuf,
    /// Background flush interval in seconds
    pub flush_interval_secs: u64,
    /// Maximum number of entries kept in memory (None = unbounded)
    pub max_entries: Option<usize>,
}

impl Config {
    // == Constructor ==
    /// Creates a Config for the given cache file with default tunables.
    pub fn new(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            max_entries: None,
        }
    }

    // == From Environment ==
    /// Creates a Config for the given cache file, reading tunables from
    /// environment variables.
    ///
    /// # Environment Variables
    /// - `MEMOCACHE_FLUSH_INTERVAL` - Flush interval in seconds (default: 10)
    /// - `MEMOCACHE_MAX_ENTRIES` - Entry bound (default: unbounded)
    pub fn from_env(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            flush_interval_secs: env::var("MEMOCACHE_FLUSH_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS),
            max_entries: env::var("MEMOCACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    // == Flush Interval ==
    /// Returns the flush interval as a Duration.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_defaults() {
        let config = Config::new("/tmp/cache.dat");
        assert_eq!(config.cache_file, PathBuf::from("/tmp/cache.dat"));
        assert_eq!(config.flush_interval_secs, DEFAULT_FLUSH_INTERVAL_SECS);
        assert_eq!(config.max_entries, None);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MEMOCACHE_FLUSH_INTERVAL");
        env::remove_var("MEMOCACHE_MAX_ENTRIES");

        let config = Config::from_env("/tmp/cache.dat");
        assert_eq!(config.flush_interval_secs, DEFAULT_FLUSH_INTERVAL_SECS);
        assert_eq!(config.max_entries, None);
    }

    #[test]
    fn test_config_flush_interval_duration() {
        let mut config = Config::new("/tmp/cache.dat");
        config.flush_interval_secs = 3;
        assert_eq!(config.flush_interval(), Duration::from_secs(3));
    }
}
