//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// Most failures never reach the caller: the cache is best-effort, so codec
/// and file errors on the get/put/load paths are logged and converted to a
/// benign result (an absent value, an empty table). `Persist` surfaces only
/// from an explicit [`force_save`](crate::Cache::force_save).
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be serialized
    #[error("Encode failed: {0}")]
    Encode(String),

    /// A stored byte stream could not be deserialized
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The persisted file violates the frame format
    #[error("Corrupt frame: {0}")]
    CorruptFrame(String),

    /// Writing or atomically replacing the persisted file failed
    #[error("Persist failed: {0}")]
    Persist(String),

    /// Underlying I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
