//! Generation Cache - process-local caches with generational invalidation
//!
//! Caches rendered artifacts per class, expires them by TTL, and advances
//! every class to a new generation at once while still serving the previous
//! generation's entries as stale.

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod manager;
pub mod tasks;

pub use cache::{Cache, CacheLookup, CacheStats, MemoryCache, MAX_TTL};
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::{CacheManager, CacheOptions, ManagerStatus, MemoryCacheManager};
