//! Write-Order Tracker Module
//!
//! Keeps the table's keys ordered by last write so a bounded table knows
//! which entry to drop. Reads never touch the tracker - the table serves
//! gets under a shared lock - so eviction picks the least recently
//! *written* key.

use std::collections::VecDeque;

// == Write Order ==
/// Key order by last write, newest at the front.
///
/// Linear scans are fine here: the tracker only exists for bounded tables,
/// and the bound caps its length.
#[derive(Debug, Default)]
pub struct WriteOrder {
    keys: VecDeque<String>,
}

impl WriteOrder {
    // == Touch ==
    /// Records a write to `key`, moving it to the front.
    pub fn touch(&mut self, key: &str) {
        if let Some(idx) = self.keys.iter().position(|k| k == key) {
            self.keys.remove(idx);
        }
        self.keys.push_front(key.to_string());
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently written key, if any.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.keys.pop_back()
    }
}
