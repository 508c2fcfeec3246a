//! Cache counters and the snapshot returned by `QueryCache::stats`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held in the memory tier, stale or not.
    pub memory_entry_count: usize,
    /// Entries this cache owns in the durable tier, stale or not.
    pub durable_entry_count: usize,
    pub memory_hits: u64,
    pub durable_hits: u64,
    /// Cacheable reads that had to go to the data source.
    pub misses: u64,
    /// Every data source call, cacheable or not.
    pub source_fetches: u64,
    /// Reads whose page size was clamped.
    pub clamp_events: u64,
    /// Durable entries removed to make room.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over cacheable reads.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.durable_hits;
        let total = hits + self.misses;
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub memory_hits: AtomicU64,
    pub durable_hits: AtomicU64,
    pub misses: AtomicU64,
    pub source_fetches: AtomicU64,
    pub clamp_events: AtomicU64,
    pub evictions: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, memory_entry_count: usize, durable_entry_count: usize) -> CacheStats {
        CacheStats {
            memory_entry_count,
            durable_entry_count,
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            source_fetches: self.source_fetches.load(Ordering::Relaxed),
            clamp_events: self.clamp_events.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
