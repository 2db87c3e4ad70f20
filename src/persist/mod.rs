//! Persistence Module
//!
//! On-disk representation of the cache and the load/save machinery.
//!
//! The persisted file is a sequence of length-prefixed key/value frames
//! terminated by a sentinel frame; saves always rewrite the whole file via
//! an atomic temp-write-then-rename so the target is never observed
//! half-written.

pub mod frame;
pub mod manager;

pub use frame::{decode_frames, encode_frames, DecodedFrames};
pub use manager::PersistenceManager;
