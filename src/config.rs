//! Configuration Module
//!
//! Handles loading and validating cache manager configuration from
//! environment variables.

use std::env;
use std::time::Duration;

use crate::cache::MAX_TTL;
use crate::error::{CacheError, Result};

/// Cache manager configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Descriptive host name carried by every cache the manager creates
    pub host: String,
    /// Default TTL in seconds for caches created without an override
    pub default_ttl: u64,
    /// Generation the manager starts with
    pub initial_generation: String,
    /// Fixed reaper interval in milliseconds; the cache TTL is used when unset
    pub reap_interval_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_HOST` - Host name (default: localhost)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_GENERATION` - Initial generation (default: empty)
    /// - `CACHE_REAP_INTERVAL_MS` - Fixed reap interval in milliseconds (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("CACHE_HOST").unwrap_or(defaults.host),
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            initial_generation: env::var("CACHE_GENERATION")
                .unwrap_or(defaults.initial_generation),
            reap_interval_ms: env::var("CACHE_REAP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Rejects values the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl == 0 {
            return Err(CacheError::InvalidConfig(
                "default TTL must be at least one second".to_string(),
            ));
        }
        if self.default_ttl > MAX_TTL.as_secs() {
            return Err(CacheError::InvalidConfig(format!(
                "default TTL must not exceed {} seconds",
                MAX_TTL.as_secs()
            )));
        }
        match self.reap_interval_ms {
            Some(0) => {
                return Err(CacheError::InvalidConfig(
                    "reap interval must be positive".to_string(),
                ));
            }
            Some(ms) if u128::from(ms) > MAX_TTL.as_millis() => {
                return Err(CacheError::InvalidConfig(format!(
                    "reap interval must not exceed {} ms",
                    MAX_TTL.as_millis()
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Fixed reap interval as a Duration, if configured.
    pub fn reap_interval(&self) -> Option<Duration> {
        self.reap_interval_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            default_ttl: 300,
            initial_generation: String::new(),
            reap_interval_ms: None,
        }
    }
}
