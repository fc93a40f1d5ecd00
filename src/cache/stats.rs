//! Cache Statistics Module
//!
//! Tracks lookup outcomes and reconciliation activity with lock-free counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache performance and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from cached content
    pub hits: u64,
    /// Lookups answered "not found" from a negative-cache placeholder
    pub negative_hits: u64,
    /// Lookups with no entry for the path
    pub misses: u64,
    /// Lookups served straight from disk without caching
    pub bypasses: u64,
    /// Files read from disk on the miss path
    pub disk_loads: u64,
    /// Entries removed by TTL or a failed update
    pub evictions: u64,
    /// Entries whose content was replaced after a file change
    pub refreshes: u64,
    /// Entries turned into negative-cache placeholders
    pub invalidations: u64,
    /// Completed reconciliation cycles
    pub scan_cycles: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Bytes of file content currently cached
    pub used_bytes: u64,
    /// Global capacity budget in bytes
    pub max_capacity: u64,
    /// Per-file size limit in bytes
    pub max_file_size: u64,
    /// Whether the cache is enabled
    pub enabled: bool,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Shared counters updated from request paths and the scanner.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    disk_loads: AtomicU64,
    evictions: AtomicU64,
    refreshes: AtomicU64,
    invalidations: AtomicU64,
    scan_cycles: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_load(&self) {
        self.disk_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_cycle(&self) {
        self.scan_cycles.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a `CacheStats`. Gauges are left at zero for
    /// the store to fill in.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            disk_loads: self.disk_loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            scan_cycles: self.scan_cycles.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}
