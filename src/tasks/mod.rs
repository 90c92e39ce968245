//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Reaper: Removes expired entries on a reconfigurable interval

mod reaper;

pub use reaper::{reap, spawn_reaper, ReaperHandle, MIN_REAP_INTERVAL};
