//! Cache Statistics Module
//!
//! Tracks per-cache read outcomes and reaper activity.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::CacheLookup;

// == Stats Recorder ==
/// Lock-free counters updated from the read path and the reaper.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    expired_reads: AtomicU64,
    reaped: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Lookup ==
    /// Counts one `get` by its outcome.
    pub fn record_lookup(&self, lookup: &CacheLookup) {
        let counter = match lookup {
            CacheLookup::Current(_) => &self.hits,
            CacheLookup::Stale(_) => &self.stale_hits,
            CacheLookup::Expired => &self.expired_reads,
            CacheLookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Reap ==
    pub fn record_reaped(&self, count: usize) {
        self.reaped.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Captures the counters together with the store's shape.
    pub fn snapshot(
        &self,
        generation: String,
        total_entries: usize,
        segments: usize,
    ) -> CacheStats {
        CacheStats {
            generation,
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_reads: self.expired_reads.load(Ordering::Relaxed),
            reaped: self.reaped.load(Ordering::Relaxed),
            total_entries,
            segments,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of one cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Live generation at snapshot time
    pub generation: String,
    /// Reads served from the live generation
    pub hits: u64,
    /// Reads served from a previous generation
    pub stale_hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Reads that found only an expired entry
    pub expired_reads: u64,
    /// Entries removed by the reaper
    pub reaped: u64,
    /// Entries currently stored across all segments
    pub total_entries: usize,
    /// Number of generation segments
    pub segments: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the share of reads that returned a value.
    ///
    /// Stale hits count as hits. Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let found = self.hits + self.stale_hits;
        let total = found + self.misses + self.expired_reads;
        if total == 0 {
            0.0
        } else {
            found as f64 / total as f64
        }
    }
}
