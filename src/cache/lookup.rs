//! Lookup Result Module
//!
//! Outcome of reading a key from a generational cache.

// == Cache Lookup ==
/// What a `get` found.
///
/// Only a hit in a previous generation reports `is_current() == false`, so a
/// caller can treat it as a signal to refresh the value in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Served from the live generation
    Current(String),
    /// Served from a previous generation
    Stale(String),
    /// Present but past its expiry; not yet reaped
    Expired,
    /// Absent from every generation
    Miss,
}

impl CacheLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Current(_) | Self::Stale(_))
    }

    pub fn is_current(&self) -> bool {
        !matches!(self, Self::Stale(_))
    }

    /// The cached value, if one was found.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Current(value) | Self::Stale(value) => Some(value.as_str()),
            Self::Expired | Self::Miss => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Current(value) | Self::Stale(value) => Some(value),
            Self::Expired | Self::Miss => None,
        }
    }
}
