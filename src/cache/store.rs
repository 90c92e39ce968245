//! Generation Store Module
//!
//! The lock-protected state of one cache: a segment of entries per
//! generation, the live generation, the TTL for new writes and the
//! uncycled flag.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::error;

use crate::cache::{CacheEntry, CacheLookup};

/// Key to entry table for one generation.
pub type Segment = HashMap<String, CacheEntry>;

/// Most segments a cache may hold once a non-forced cycle has completed.
pub const MAX_RETAINED_GENERATIONS: usize = 2;

// == Generation Store ==
/// Segmented storage keyed by generation.
#[derive(Debug)]
pub struct GenerationStore {
    /// Segments by generation id, created lazily on first write
    segments: HashMap<String, Segment>,
    /// Generation that receives writes
    current_generation: String,
    /// Lifetime applied to new entries
    ttl: Duration,
    /// Skip non-forced cycles when set
    uncycled: bool,
}

impl GenerationStore {
    // == Constructor ==
    /// Creates an empty store positioned at `generation`.
    pub fn new(generation: impl Into<String>, ttl: Duration, uncycled: bool) -> Self {
        Self {
            segments: HashMap::new(),
            current_generation: generation.into(),
            ttl,
            uncycled,
        }
    }

    pub fn current_generation(&self) -> &str {
        &self.current_generation
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn uncycled(&self) -> bool {
        self.uncycled
    }

    pub fn set_uncycled(&mut self, uncycled: bool) {
        self.uncycled = uncycled;
    }

    // == Lookup ==
    /// Finds `key`, preferring the live generation.
    ///
    /// Expired entries read as a miss but stay in place until the reaper
    /// runs. A hit or an expired entry in the live segment ends the search.
    pub fn lookup(&self, key: &str) -> CacheLookup {
        let now = Instant::now();

        if let Some(entry) = self
            .segments
            .get(&self.current_generation)
            .and_then(|segment| segment.get(key))
        {
            if entry.is_expired_at(now) {
                return CacheLookup::Expired;
            }
            return CacheLookup::Current(entry.value.clone());
        }

        let stale = self
            .segments
            .iter()
            .filter(|(generation, _)| **generation != self.current_generation)
            .find_map(|(_, segment)| segment.get(key));

        match stale {
            Some(entry) if entry.is_expired_at(now) => CacheLookup::Expired,
            Some(entry) => CacheLookup::Stale(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    // == Insert ==
    /// Writes into the live generation, creating its segment if needed.
    pub fn insert(&mut self, key: String, value: String) {
        let entry = CacheEntry::new(value, self.ttl);
        self.segments
            .entry(self.current_generation.clone())
            .or_default()
            .insert(key, entry);
    }

    // == Remove ==
    /// Removes `key` from every segment. Returns how many copies were dropped.
    pub fn remove(&mut self, key: &str) -> usize {
        self.segments
            .values_mut()
            .filter_map(|segment| segment.remove(key))
            .count()
    }

    // == Remove Expired ==
    /// Physically removes every expired entry in every segment.
    ///
    /// Returns the number of entries removed. Empty segments are kept so the
    /// live generation's segment survives a full expiry.
    pub fn remove_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for segment in self.segments.values_mut() {
            let before = segment.len();
            segment.retain(|_, entry| !entry.is_expired_at(now));
            removed += before - segment.len();
        }
        removed
    }

    // == Advance ==
    /// Moves the store to `generation` and prunes old segments.
    ///
    /// Forced advances keep only `generation`. Otherwise `previous` is kept as
    /// well so its entries can still be served as stale.
    pub fn advance(&mut self, generation: &str, previous: &str, force: bool) {
        self.current_generation = generation.to_string();
        self.segments.entry(generation.to_string()).or_default();

        self.segments.retain(|id, _| {
            id == generation || (!force && id == previous)
        });

        self.enforce_segment_limit(if force { 1 } else { MAX_RETAINED_GENERATIONS });
    }

    /// Drops everything but the live segment if more than `limit` segments
    /// are held.
    fn enforce_segment_limit(&mut self, limit: usize) {
        if self.segments.len() <= limit {
            return;
        }
        error!(
            generation = %self.current_generation,
            "Store held {} segments, limit is {}; keeping only the live one",
            self.segments.len(),
            limit
        );
        let live = self.current_generation.clone();
        self.segments.retain(|id, _| *id == live);
    }

    // == Inspection ==
    /// Number of entries across all segments, expired ones included.
    pub fn len(&self) -> usize {
        self.segments.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Entry count of one generation's segment, `None` if it does not exist.
    pub fn segment_len(&self, generation: &str) -> Option<usize> {
        self.segments.get(generation).map(HashMap::len)
    }
}
