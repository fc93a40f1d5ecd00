//! Cache Module
//!
//! Bounded in-memory cache of static file contents, kept in sync with the
//! filesystem by a background reconciliation loop.

mod entry;
mod reconcile;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, CachedFile, EntryState, FileMeta};
pub use reconcile::{CycleReport, Outcome};
pub use stats::{CacheStats, StatsRecorder};
pub use store::CacheStore;

// == Public Constants ==
/// Default largest cacheable file (4 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Default total cache budget (64 MiB)
pub const DEFAULT_MAX_CAPACITY: u64 = 64 * 1024 * 1024;

/// Default seconds between reconciliation cycles
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;
