//! Persistence Manager Module
//!
//! Owns the on-disk cache file path: loads it at startup and rewrites it
//! atomically on save. The load path never fails - a missing file is a
//! first run, a corrupt one is sacrificed with a warning - so a bad cache
//! can never block host startup.
//!
//! Saves are serialized behind an internal lock: the caller-driven
//! [`Cache::force_save`](crate::Cache::force_save) and the background
//! flush task may run concurrently, and an unserialized pair of saves
//! would share the temp file (tearing the bytes in flight) or rename an
//! older snapshot over a newer one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::frame::{decode_frames, encode_frames};
use crate::cache::MemoryTable;
use crate::error::{CacheError, Result};

// == Persistence Manager ==
/// Loads and atomically saves the persisted cache file.
#[derive(Debug)]
pub struct PersistenceManager {
    /// Target path of the cache file
    path: PathBuf,
    /// Held for the duration of one save cycle
    save_lock: Mutex<()>,
}

impl PersistenceManager {
    // == Constructor ==
    /// Creates a manager for the given cache file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_lock: Mutex::new(()),
        }
    }

    /// Returns the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Load ==
    /// Reads the cache file and decodes its entries.
    ///
    /// Missing file, corrupt file and truncated file all degrade rather
    /// than error: empty, empty-with-warning and partial-with-warning
    /// respectively.
    pub fn load(&self) -> Vec<(String, Vec<u8>)> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Failed to read cache file {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match decode_frames(&bytes) {
            Ok(decoded) => {
                if decoded.truncated {
                    warn!(
                        "Cache file {} is truncated, recovered {} entries",
                        self.path.display(),
                        decoded.entries.len()
                    );
                } else {
                    info!(
                        "Loaded {} cached entries from {}",
                        decoded.entries.len(),
                        self.path.display()
                    );
                }
                decoded.entries
            }
            Err(e) => {
                warn!(
                    "Cache file {} is corrupt, starting empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    // == Checkpoint ==
    /// Persists the table under the save lock: snapshot, save, mark saved.
    ///
    /// Taking the snapshot while holding the lock keeps snapshot order and
    /// rename order identical, so a slower save cycle can never rename a
    /// stale snapshot over a fresher one and then see the table report
    /// clean. Returns the number of entries persisted.
    pub fn checkpoint(&self, table: &MemoryTable) -> Result<usize> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (entries, version) = table.snapshot();
        self.write_snapshot(&entries)?;
        table.mark_saved(version);
        Ok(entries.len())
    }

    // == Save ==
    /// Writes the full snapshot to a sibling temp file, syncs it, then
    /// renames it over the target path. Serialized with any concurrent
    /// checkpoint.
    ///
    /// On any failure the temp file is removed and the previously persisted
    /// file is left untouched.
    pub fn save(&self, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_snapshot(entries)
    }

    /// Temp-write-then-rename body; callers hold the save lock.
    fn write_snapshot(&self, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let tmp = self.temp_path();
        let bytes = encode_frames(entries);

        if let Err(e) = write_file(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::Persist(format!(
                "writing temp file {}: {}",
                tmp.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::Persist(format!(
                "replacing {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!(
            "Saved {} entries to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    // == Temp Path ==
    /// Sibling temp path, same directory so the rename stays on one device.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Creates the file, writes all bytes and syncs to disk.
fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
