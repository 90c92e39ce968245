//! Error types for the generation cache
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; it is reported through [`crate::cache::CacheLookup::Miss`].

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache and manager operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A remote-backed cache could not reach its backend.
    ///
    /// The in-memory implementation never produces this variant.
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend unavailable: connection refused");

        let err = CacheError::InvalidConfig("ttl must be positive".to_string());
        assert!(err.to_string().contains("ttl must be positive"));
    }
}
