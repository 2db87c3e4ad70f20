//! Background Tasks Module
//!
//! The periodic flush task that persists the table when it is dirty.

mod flush;

pub use flush::spawn_flush_task;
