//! Cache Manager Module
//!
//! Registry of caches by class and owner of the system-wide generation.

mod registry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::Cache;
use crate::error::Result;

pub use registry::{ManagerStatus, MemoryCacheManager};

// == Cache Options ==
/// Options recognized by [`CacheManager::get_cache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Overrides the manager's default TTL
    pub ttl: Option<Duration>,
    /// Exclude the cache from non-forced cycles
    pub uncycled: bool,
}

impl CacheOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn uncycled(mut self) -> Self {
        self.uncycled = true;
        self
    }
}

// == Cache Manager Trait ==
#[async_trait]
pub trait CacheManager: Send + Sync {
    /// Returns the cache for `class`, creating it on first use.
    ///
    /// For an existing cache the options are applied to it: the uncycled
    /// flag is always overwritten, and a differing TTL replaces the old one.
    async fn get_cache(&self, class: &str, options: CacheOptions) -> Arc<dyn Cache>;

    /// Advances every cycled cache to `generation`.
    ///
    /// Non-forced cycles keep the previous generation for stale reads and
    /// skip uncycled caches. Forced cycles include uncycled caches and drop
    /// all history.
    async fn cycle(&self, generation: &str, force: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::default();
        assert!(options.ttl.is_none());
        assert!(!options.uncycled);

        let options = CacheOptions::default()
            .with_ttl(Duration::from_secs(5))
            .uncycled();
        assert_eq!(options.ttl, Some(Duration::from_secs(5)));
        assert!(options.uncycled);
    }
}
