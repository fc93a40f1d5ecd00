//! Reconciliation Module
//!
//! Brings cached entries back in line with the filesystem. Each cycle visits
//! every entry once and moves it through the staleness/update rules below.
//!
//! | Outcome   | When                                               | Effect                      |
//! |-----------|----------------------------------------------------|-----------------------------|
//! | Stale     | untouched for longer than the scan interval        | evicted                     |
//! | Unknown   | stat failed for a reason other than "not found"    | left as is                  |
//! | NotExist  | file is gone                                       | kept as a negative entry    |
//! | NoChange  | mtime and size match                               | left as is                  |
//! | Failed    | new size breaks the per-file limit or the budget   | evicted                     |
//! | Preloaded | new size fits alongside the old content            | read, then swapped in       |
//! | Swapped   | new size fits only once the old content is dropped | released, read, installed   |

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::store::StoreInner;
use crate::cache::{CacheEntry, CacheStore, CachedFile, EntryState, FileMeta};

// == Outcome ==
/// Result of reconciling one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Stale,
    Unknown,
    NotExist,
    NoChange,
    Failed,
    Preloaded,
    Swapped,
}

// == Cycle Report ==
/// Per-outcome tally of one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub stale: usize,
    pub unknown: usize,
    pub not_exist: usize,
    pub no_change: usize,
    pub failed: usize,
    pub preloaded: usize,
    pub swapped: usize,
    /// Entries that turned into negative placeholders this cycle
    pub invalidated: usize,
}

impl CycleReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Stale => self.stale += 1,
            Outcome::Unknown => self.unknown += 1,
            Outcome::NotExist => self.not_exist += 1,
            Outcome::NoChange => self.no_change += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Preloaded => self.preloaded += 1,
            Outcome::Swapped => self.swapped += 1,
        }
    }

    /// Number of entries visited.
    pub fn visited(&self) -> usize {
        self.stale
            + self.unknown
            + self.not_exist
            + self.no_change
            + self.failed
            + self.preloaded
            + self.swapped
    }

    /// Number of entries evicted.
    pub fn evicted(&self) -> usize {
        self.stale + self.failed
    }

    /// Number of entries whose content was replaced.
    pub fn refreshed(&self) -> usize {
        self.preloaded + self.swapped
    }

    /// True if the cycle evicted, refreshed or invalidated anything.
    /// Placeholders that were already missing do not count.
    pub fn has_changes(&self) -> bool {
        self.evicted() > 0 || self.refreshed() > 0 || self.invalidated > 0
    }
}

impl CacheStore {
    // == Run Cycle ==
    /// Runs one reconciliation cycle over every entry.
    ///
    /// The entry list is snapshotted up front so no map lock is held while
    /// files are stat'ed or read.
    pub async fn run_cycle(&self) -> CycleReport {
        let snapshot: Vec<(std::path::PathBuf, Arc<CacheEntry>)> = {
            let inner = self.inner.read().await;
            inner
                .entries
                .iter()
                .map(|(path, entry)| (path.clone(), Arc::clone(entry)))
                .collect()
        };

        let mut report = CycleReport::default();
        for (path, entry) in snapshot {
            let was_missing = entry.peek().await == EntryState::Missing;
            let outcome = self.reconcile_entry(&path, &entry).await;
            debug!(path = %path.display(), ?outcome, "Reconciled entry");
            report.record(outcome);
            if outcome == Outcome::NotExist && !was_missing {
                report.invalidated += 1;
            }
        }

        self.stats.record_scan_cycle();
        report
    }

    async fn reconcile_entry(&self, path: &Path, entry: &Arc<CacheEntry>) -> Outcome {
        if entry.is_stale(self.scan_interval) {
            self.evict(path, entry).await;
            return Outcome::Stale;
        }

        let fresh = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => FileMeta::from_metadata(&metadata),
            Ok(_) => return self.mark_missing(path, entry).await,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return self.mark_missing(path, entry).await;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to stat cached file");
                return Outcome::Unknown;
            }
        };

        let old_size = match entry.peek().await {
            EntryState::Present(file) if !fresh.differs_from(&file.meta) => {
                return Outcome::NoChange;
            }
            EntryState::Present(file) => file.len(),
            EntryState::Missing | EntryState::Reloading => 0,
        };

        let new_size = fresh.len;
        let used = self.inner.read().await.used_bytes;
        if new_size > self.max_file_size
            || used.saturating_sub(old_size) + new_size > self.max_capacity
        {
            self.evict(path, entry).await;
            return Outcome::Failed;
        }

        if used + new_size <= self.max_capacity {
            self.preload_update(path, entry).await
        } else {
            self.swap_update(path, entry).await
        }
    }

    /// Reads the new content while the old content keeps serving, then swaps.
    async fn preload_update(&self, path: &Path, entry: &Arc<CacheEntry>) -> Outcome {
        let file = match CachedFile::read(path).await {
            Ok(Some(file)) => file,
            Ok(None) => return self.mark_missing(path, entry).await,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to reload cached file");
                return Outcome::Unknown;
            }
        };

        let mut inner = self.inner.write().await;
        if !inner.holds(path, entry) {
            return Outcome::NoChange;
        }
        let old_size = entry.size_bytes().await;
        if !self.fits(&inner, old_size, file.len()) {
            self.remove_locked(&mut inner, path, entry).await;
            return Outcome::Failed;
        }

        let size = file.len();
        entry.swap(file).await;
        inner.used_bytes = inner.used_bytes - old_size + size;
        self.stats.record_refresh();
        Outcome::Preloaded
    }

    /// Releases the old content first, then loads and installs the new one.
    async fn swap_update(&self, path: &Path, entry: &Arc<CacheEntry>) -> Outcome {
        {
            let mut inner = self.inner.write().await;
            if !inner.holds(path, entry) {
                return Outcome::NoChange;
            }
            let released = entry.release().await;
            inner.used_bytes -= released;
        }

        let file = match CachedFile::read(path).await {
            Ok(Some(file)) => file,
            Ok(None) => return self.mark_missing(path, entry).await,
            Err(err) => {
                // Old content is gone, so there is nothing left to keep serving
                warn!(path = %path.display(), error = %err, "Failed to reload cached file");
                self.evict(path, entry).await;
                return Outcome::Failed;
            }
        };

        let mut inner = self.inner.write().await;
        if !inner.holds(path, entry) {
            return Outcome::NoChange;
        }
        if !self.fits(&inner, 0, file.len()) {
            self.remove_locked(&mut inner, path, entry).await;
            return Outcome::Failed;
        }

        inner.used_bytes += file.len();
        entry.swap(file).await;
        self.stats.record_refresh();
        Outcome::Swapped
    }

    /// Turns the entry into a negative-cache placeholder.
    async fn mark_missing(&self, path: &Path, entry: &Arc<CacheEntry>) -> Outcome {
        let mut inner = self.inner.write().await;
        if inner.holds(path, entry) {
            let was_missing = entry.peek().await == EntryState::Missing;
            inner.used_bytes -= entry.invalidate().await;
            if !was_missing {
                self.stats.record_invalidation();
            }
        }
        Outcome::NotExist
    }

    async fn evict(&self, path: &Path, entry: &Arc<CacheEntry>) {
        let mut inner = self.inner.write().await;
        if inner.holds(path, entry) {
            self.remove_locked(&mut inner, path, entry).await;
        }
    }

    async fn remove_locked(&self, inner: &mut StoreInner, path: &Path, entry: &Arc<CacheEntry>) {
        inner.entries.remove(path);
        inner.used_bytes -= entry.size_bytes().await;
        self.stats.record_eviction();
        debug!(path = %path.display(), "Evicted entry");
    }

    /// Returns true if replacing `old_size` cached bytes with `new_size`
    /// stays within both limits.
    fn fits(&self, inner: &StoreInner, old_size: u64, new_size: u64) -> bool {
        new_size <= self.max_file_size
            && inner.used_bytes - old_size + new_size <= self.max_capacity
    }
}
