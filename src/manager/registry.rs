//! In-Memory Cache Manager
//!
//! Creates one [`MemoryCache`] per class and cycles them all to a new
//! generation under a single registry lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{Cache, MemoryCache};
use crate::config::Config;
use crate::error::Result;
use crate::manager::{CacheManager, CacheOptions};

#[derive(Debug)]
struct Registry {
    caches: HashMap<String, Arc<MemoryCache>>,
    generation: String,
    last_cycled_at: Option<DateTime<Utc>>,
}

// == Manager Status ==
/// Serializable summary of a manager.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatus {
    pub host: String,
    pub generation: String,
    /// Registered classes, sorted
    pub classes: Vec<String>,
    pub last_cycled_at: Option<DateTime<Utc>>,
}

// == Memory Cache Manager ==
/// Owns every cache of a process and the authoritative generation.
///
/// Construct one and pass it by reference to collaborators; several managers
/// can coexist, e.g. one per test. Lock order is always registry first, then
/// a cache.
#[derive(Debug)]
pub struct MemoryCacheManager {
    host: String,
    default_ttl: Duration,
    /// Fixed reaper period for every cache; each cache's TTL when unset
    reap_interval: Option<Duration>,
    registry: RwLock<Registry>,
}

impl MemoryCacheManager {
    // == Constructor ==
    pub fn new(
        host: impl Into<String>,
        generation: impl Into<String>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            default_ttl,
            reap_interval: None,
            registry: RwLock::new(Registry {
                caches: HashMap::new(),
                generation: generation.into(),
                last_cycled_at: None,
            }),
        }
    }

    /// Creates a manager from configuration.
    pub fn from_config(config: &Config) -> Self {
        let manager = Self::new(
            config.host.clone(),
            config.initial_generation.clone(),
            config.default_ttl(),
        );
        match config.reap_interval() {
            Some(interval) => manager.with_reap_interval(interval),
            None => manager,
        }
    }

    /// Uses a fixed reaper period for caches created from now on.
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = Some(interval);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Current system-wide generation.
    pub async fn generation(&self) -> String {
        self.registry.read().await.generation.clone()
    }

    // == Get Or Create ==
    /// Concrete form of [`CacheManager::get_cache`].
    ///
    /// Creation happens under the registry's write lock with a second lookup,
    /// so concurrent first callers for a class share one instance.
    pub async fn get_or_create(&self, class: &str, options: CacheOptions) -> Arc<MemoryCache> {
        let existing = self.registry.read().await.caches.get(class).cloned();
        if let Some(cache) = existing {
            cache.update_options(options.ttl, options.uncycled).await;
            return cache;
        }

        let mut registry = self.registry.write().await;
        if let Some(cache) = registry.caches.get(class).cloned() {
            drop(registry);
            cache.update_options(options.ttl, options.uncycled).await;
            return cache;
        }

        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let cache = Arc::new(MemoryCache::spawn(
            class,
            self.host.as_str(),
            registry.generation.clone(),
            ttl,
            options.uncycled,
            self.reap_interval,
        ));
        registry.caches.insert(class.to_string(), cache.clone());

        info!(
            class = %class,
            generation = %registry.generation,
            "Created cache with ttl={:?}, uncycled={}",
            ttl, options.uncycled
        );
        cache
    }

    // == Inspection ==
    /// Registered classes, sorted.
    pub async fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.registry.read().await.caches.keys().cloned().collect();
        classes.sort();
        classes
    }

    pub async fn status(&self) -> ManagerStatus {
        let registry = self.registry.read().await;
        let mut classes: Vec<String> = registry.caches.keys().cloned().collect();
        classes.sort();
        ManagerStatus {
            host: self.host.clone(),
            generation: registry.generation.clone(),
            classes,
            last_cycled_at: registry.last_cycled_at,
        }
    }
}

#[async_trait]
impl CacheManager for MemoryCacheManager {
    async fn get_cache(&self, class: &str, options: CacheOptions) -> Arc<dyn Cache> {
        self.get_or_create(class, options).await
    }

    async fn cycle(&self, generation: &str, force: bool) -> Result<()> {
        // Held for the whole sweep so no reader sees a partially cycled registry
        let mut registry = self.registry.write().await;
        let previous = std::mem::replace(&mut registry.generation, generation.to_string());
        registry.last_cycled_at = Some(Utc::now());

        let mut skipped = 0;
        for (class, cache) in &registry.caches {
            if !cache.advance(generation, &previous, force).await {
                debug!(class = %class, "Skipping uncycled cache");
                skipped += 1;
            }
        }

        info!(
            "Cycled generation {} -> {} (force={}, caches={}, skipped={})",
            previous,
            generation,
            force,
            registry.caches.len(),
            skipped
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_TTL: Duration = Duration::from_secs(300);

    fn manager() -> MemoryCacheManager {
        MemoryCacheManager::new("example.org", "g1", LONG_TTL)
    }

    #[tokio::test]
    async fn test_new_cache_inherits_manager_state() {
        let manager = manager();
        let cache = manager.get_or_create("pages", CacheOptions::default()).await;

        assert_eq!(cache.host(), "example.org");
        assert_eq!(cache.checksum().await, "g1");
        assert_eq!(cache.ttl().await, LONG_TTL);
        assert!(!cache.uncycled().await);
    }

    #[tokio::test]
    async fn test_ttl_override_on_creation() {
        let manager = manager();
        let options = CacheOptions::default().with_ttl(Duration::from_secs(30));
        let cache = manager.get_or_create("pages", options).await;
        assert_eq!(cache.ttl().await, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_existing_cache_gets_options_updated() {
        let manager = manager();
        let first = manager.get_or_create("pages", CacheOptions::default()).await;

        let options = CacheOptions::default()
            .with_ttl(Duration::from_secs(10))
            .uncycled();
        let second = manager.get_or_create("pages", options).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.ttl().await, Duration::from_secs(10));
        assert!(first.uncycled().await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(first.reap_interval(), Duration::from_secs(10));

        // Uncycled is overwritten even without a TTL override
        manager.get_or_create("pages", CacheOptions::default()).await;
        assert!(!first.uncycled().await);
        assert_eq!(first.ttl().await, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cache_created_after_cycle_uses_new_generation() {
        let manager = manager();
        manager.cycle("g2", false).await.unwrap();

        let cache = manager.get_or_create("late", CacheOptions::default()).await;
        assert_eq!(cache.checksum().await, "g2");
        assert_eq!(manager.generation().await, "g2");
    }

    #[tokio::test]
    async fn test_cycle_creates_empty_segment() {
        let manager = manager();
        let cache = manager.get_or_create("pages", CacheOptions::default()).await;
        assert_eq!(cache.segment_count().await, 0);

        manager.cycle("g2", false).await.unwrap();
        assert_eq!(cache.segment_len("g2").await, Some(0));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = Config {
            host: "cdn.local".to_string(),
            default_ttl: 60,
            initial_generation: "boot".to_string(),
            reap_interval_ms: Some(250),
        };
        let manager = MemoryCacheManager::from_config(&config);
        assert_eq!(manager.host(), "cdn.local");
        assert_eq!(manager.default_ttl(), Duration::from_secs(60));
        assert_eq!(manager.generation().await, "boot");

        let cache = manager.get_or_create("pages", CacheOptions::default()).await;
        assert_eq!(cache.reap_interval(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_status() {
        let manager = manager();
        manager.get_or_create("pages", CacheOptions::default()).await;
        manager.get_or_create("nav", CacheOptions::default()).await;

        let status = manager.status().await;
        assert_eq!(status.classes, vec!["nav".to_string(), "pages".to_string()]);
        assert!(status.last_cycled_at.is_none());

        manager.cycle("g2", false).await.unwrap();
        let status = manager.status().await;
        assert_eq!(status.generation, "g2");
        assert!(status.last_cycled_at.is_some());

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"host\":\"example.org\""));
        assert_eq!(manager.classes().await, status.classes);
    }
}
