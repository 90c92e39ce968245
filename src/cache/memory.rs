//! In-Memory Cache Module
//!
//! A single cache class: generation store behind a reader/writer lock, its
//! reaper, and read statistics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{Cache, CacheLookup, CacheStats, GenerationStore, StatsRecorder};
use crate::error::Result;
use crate::tasks::{reap, spawn_reaper, ReaperHandle};

// == Memory Cache ==
/// In-process cache for one class.
///
/// Reads take the shared lock, every mutation the exclusive one. Nothing
/// awaits while holding the lock except the lock acquisition itself.
#[derive(Debug)]
pub struct MemoryCache {
    class: String,
    host: String,
    store: Arc<RwLock<GenerationStore>>,
    stats: Arc<StatsRecorder>,
    /// Fixed reaper period; the TTL is used when unset
    reap_interval: Option<Duration>,
    reaper: ReaperHandle,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates the cache and starts its reaper on the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn spawn(
        class: impl Into<String>,
        host: impl Into<String>,
        generation: impl Into<String>,
        ttl: Duration,
        uncycled: bool,
        reap_interval: Option<Duration>,
    ) -> Self {
        let class = class.into();
        let store = Arc::new(RwLock::new(GenerationStore::new(generation, ttl, uncycled)));
        let stats = Arc::new(StatsRecorder::new());
        let reaper = spawn_reaper(
            class.clone(),
            store.clone(),
            stats.clone(),
            reap_interval.unwrap_or(ttl),
        );

        Self {
            class,
            host: host.into(),
            store,
            stats,
            reap_interval,
            reaper,
        }
    }

    // == Update Options ==
    /// Applies options from a repeated registration.
    ///
    /// `uncycled` is always overwritten. A differing TTL is stored and then,
    /// once the lock is released, pushed to the reaper.
    pub async fn update_options(&self, ttl: Option<Duration>, uncycled: bool) {
        let changed_ttl = {
            let mut store = self.store.write().await;
            store.set_uncycled(uncycled);
            match ttl {
                Some(ttl) if ttl != store.ttl() => {
                    store.set_ttl(ttl);
                    Some(ttl)
                }
                _ => None,
            }
        };

        if let Some(ttl) = changed_ttl {
            debug!(class = %self.class, "TTL changed to {:?}", ttl);
            self.reaper.reconfigure(self.reap_interval.unwrap_or(ttl));
        }
    }

    // == Advance ==
    /// Moves this cache to `generation`, pruning per the cycle rules.
    ///
    /// Returns false when the cache is uncycled and the cycle is not forced.
    pub async fn advance(&self, generation: &str, previous: &str, force: bool) -> bool {
        let mut store = self.store.write().await;
        if store.uncycled() && !force {
            return false;
        }
        store.advance(generation, previous, force);
        true
    }

    // == Reap ==
    /// Runs a reaper pass immediately. Returns the number of entries removed.
    pub async fn reap_now(&self) -> usize {
        let removed = reap(&self.store).await;
        self.stats.record_reaped(removed);
        removed
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        self.stats.snapshot(
            store.current_generation().to_string(),
            store.len(),
            store.segment_count(),
        )
    }

    // == Inspection ==
    /// Entries across all segments, including expired ones not yet reaped.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn segment_count(&self) -> usize {
        self.store.read().await.segment_count()
    }

    pub async fn segment_len(&self, generation: &str) -> Option<usize> {
        self.store.read().await.segment_len(generation)
    }

    /// Period the reaper is currently ticking at.
    pub fn reap_interval(&self) -> Duration {
        self.reaper.applied_interval()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn checksum(&self) -> String {
        self.store.read().await.current_generation().to_string()
    }

    fn class(&self) -> &str {
        &self.class
    }

    fn host(&self) -> &str {
        &self.host
    }

    async fn ttl(&self) -> Duration {
        self.store.read().await.ttl()
    }

    async fn uncycled(&self) -> bool {
        self.store.read().await.uncycled()
    }

    async fn get(&self, key: &str) -> Result<CacheLookup> {
        let lookup = self.store.read().await.lookup(key);
        self.stats.record_lookup(&lookup);
        Ok(lookup)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.store.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.remove(key);
        Ok(())
    }
}
