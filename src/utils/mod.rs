//! Utility modules shared by the index and the watcher.

pub mod category;
pub mod date;
pub mod log;
