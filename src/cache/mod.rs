//! Cache Module
//!
//! Provides generation-segmented caching with TTL expiration, lazy deletion
//! on read and background reaping.

mod entry;
mod lookup;
mod memory;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::{CacheEntry, MAX_TTL};
pub use lookup::CacheLookup;
pub use memory::MemoryCache;
pub use stats::{CacheStats, StatsRecorder};
pub use store::{GenerationStore, Segment, MAX_RETAINED_GENERATIONS};

// == Cache Trait ==
/// Capability handed to collaborators by a
/// [`CacheManager`](crate::manager::CacheManager).
///
/// Implementations other than [`MemoryCache`] may be remote-backed, so every
/// data operation returns a `Result` even though the in-memory one never
/// fails. Cancel an operation by dropping its future.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Live generation of this cache.
    async fn checksum(&self) -> String;

    fn class(&self) -> &str;

    fn host(&self) -> &str;

    async fn ttl(&self) -> Duration;

    async fn uncycled(&self) -> bool;

    /// Reads `key`, falling back to the previous generation.
    async fn get(&self, key: &str) -> Result<CacheLookup>;

    /// Writes `value` into the live generation.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key` from every generation. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
