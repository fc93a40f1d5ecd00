//! Cache Store Module
//!
//! Maps file paths to cached content under a per-file limit and a global byte
//! budget, and owns the on/off switch for the background scanner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, CachedFile, EntryState, StatsRecorder};
use crate::tasks::{spawn_scan_task, ScanTask};

// == Store Inner ==
/// Map structure and byte accounting, guarded together by the coarse lock.
#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    pub(crate) entries: HashMap<PathBuf, Arc<CacheEntry>>,
    pub(crate) used_bytes: u64,
}

impl StoreInner {
    /// Returns true if `entry` is still the one mapped at `path`.
    pub(crate) fn holds(&self, path: &Path, entry: &Arc<CacheEntry>) -> bool {
        self.entries
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }
}

// == Cache Store ==
/// Bounded in-memory cache of static file contents.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries and used bytes
    pub(crate) inner: RwLock<StoreInner>,
    /// Per-path gates serializing miss-path loads
    inflight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    /// Largest file that may be cached, in bytes
    pub(crate) max_file_size: u64,
    /// Total bytes the cache may hold
    pub(crate) max_capacity: u64,
    /// Wait between scans, also the idle TTL of an entry
    pub(crate) scan_interval: Duration,
    enabled: AtomicBool,
    /// Running (or draining) scanner task
    scanner: Mutex<Option<ScanTask>>,
    pub(crate) stats: StatsRecorder,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a disabled, empty store.
    ///
    /// # Arguments
    /// * `max_file_size` - Largest cacheable file in bytes
    /// * `max_capacity` - Total byte budget across all entries
    /// * `scan_interval` - Wait between reconciliation cycles and entry idle TTL
    pub fn new(max_file_size: u64, max_capacity: u64, scan_interval: Duration) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            inflight: Mutex::new(HashMap::new()),
            max_file_size,
            max_capacity,
            scan_interval,
            enabled: AtomicBool::new(false),
            scanner: Mutex::new(None),
            stats: StatsRecorder::new(),
        }
    }

    // == Lookup ==
    /// Returns the content and metadata of the file at `path`.
    ///
    /// Serves from the cache when an entry exists, otherwise reads the file
    /// and caches it if it fits the budget. `None` means the file does not
    /// exist or could not be read; I/O errors never reach the caller.
    pub async fn lookup(&self, path: impl AsRef<Path>) -> Option<CachedFile> {
        let path = path.as_ref();

        if !self.is_enabled() {
            self.stats.record_bypass();
            return read_uncached(path).await;
        }

        if let Some(state) = self.probe(path).await {
            return self.serve(path, state).await;
        }

        let gate = self.inflight_gate(path).await;
        let result = {
            let _guard = gate.lock().await;
            self.load(path).await
        };
        self.release_gate(path, gate).await;
        result
    }

    /// Snapshot of the entry at `path`, touching it.
    async fn probe(&self, path: &Path) -> Option<EntryState> {
        let entry = self.inner.read().await.entries.get(path).cloned()?;
        Some(entry.get().await)
    }

    async fn serve(&self, path: &Path, state: EntryState) -> Option<CachedFile> {
        match state {
            EntryState::Present(file) => {
                self.stats.record_hit();
                Some(file)
            }
            EntryState::Missing => {
                self.stats.record_negative_hit();
                None
            }
            EntryState::Reloading => {
                self.stats.record_bypass();
                read_uncached(path).await
            }
        }
    }

    /// Miss path. Runs with the per-path gate held.
    async fn load(&self, path: &Path) -> Option<CachedFile> {
        // Another loader may have inserted while we waited on the gate
        if let Some(state) = self.probe(path).await {
            return self.serve(path, state).await;
        }

        self.stats.record_miss();
        let file = match CachedFile::read(path).await {
            Ok(Some(file)) => file,
            Ok(None) => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read file");
                return None;
            }
        };
        self.stats.record_disk_load();

        if self.try_insert(path, &file).await {
            debug!(path = %path.display(), size = file.len(), "Cached file");
        } else {
            self.stats.record_bypass();
            debug!(path = %path.display(), size = file.len(), "Serving file uncached");
        }
        Some(file)
    }

    // == Insert ==
    /// Adds `file` under `path` if it fits both limits.
    async fn try_insert(&self, path: &Path, file: &CachedFile) -> bool {
        let size = file.len();
        if size > self.max_file_size {
            return false;
        }

        let mut inner = self.inner.write().await;
        // A disable may have raced the disk read; its final clear must win
        if !self.is_enabled() || inner.entries.contains_key(path) {
            return false;
        }
        if inner.used_bytes + size > self.max_capacity {
            return false;
        }

        inner
            .entries
            .insert(path.to_path_buf(), Arc::new(CacheEntry::new(path, file.clone())));
        inner.used_bytes += size;
        true
    }

    async fn inflight_gate(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(path.to_path_buf()).or_default().clone()
    }

    async fn release_gate(&self, path: &Path, gate: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&gate) == 2 {
            inflight.remove(path);
        }
    }

    // == Enable Controller ==
    /// Returns true if the cache is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turns the cache on or off. Repeating the current state is a no-op.
    ///
    /// Enabling starts one scanner task. Disabling signals the scanner, which
    /// drops every entry as its last act.
    pub async fn set_enabled(self: &Arc<Self>, on: bool) {
        let mut scanner = self.scanner.lock().await;
        if on == self.is_enabled() {
            return;
        }

        if on {
            // A previous scanner may still be finishing its final clear
            if let Some(previous) = scanner.take() {
                previous.join().await;
            }
            self.enabled.store(true, Ordering::Release);
            *scanner = Some(spawn_scan_task(Arc::clone(self)));
            info!("File cache enabled");
        } else {
            self.enabled.store(false, Ordering::Release);
            if let Some(task) = scanner.as_ref() {
                task.stop();
            }
            info!("File cache disabled");
        }
    }

    /// Disables the cache and waits for the scanner to finish.
    pub async fn shutdown(self: &Arc<Self>) {
        self.set_enabled(false).await;
        let task = self.scanner.lock().await.take();
        if let Some(task) = task {
            task.join().await;
        }
    }

    // == Trigger Scan ==
    /// Requests a reconciliation cycle ahead of the timer.
    ///
    /// Returns false if the cache is disabled or a trigger is already pending.
    pub async fn trigger_scan(&self) -> bool {
        let scanner = self.scanner.lock().await;
        match scanner.as_ref() {
            Some(task) if self.is_enabled() => task.trigger(),
            _ => false,
        }
    }

    // == Clear ==
    /// Drops every entry and resets the byte count.
    pub(crate) async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.used_bytes = 0;
        dropped
    }

    // == Accessors ==
    /// Bytes of file content currently cached.
    pub async fn used_bytes(&self) -> u64 {
        self.inner.read().await.used_bytes
    }

    /// Number of entries, including negative-cache placeholders.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Returns true if an entry (positive or negative) exists for `path`.
    pub async fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.inner.read().await.entries.contains_key(path.as_ref())
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.snapshot();
        {
            let inner = self.inner.read().await;
            stats.total_entries = inner.entries.len();
            stats.used_bytes = inner.used_bytes;
        }
        stats.max_capacity = self.max_capacity;
        stats.max_file_size = self.max_file_size;
        stats.enabled = self.is_enabled();
        stats
    }
}

/// Reads a file for a single response without touching the cache.
async fn read_uncached(path: &Path) -> Option<CachedFile> {
    match CachedFile::read(path).await {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read file");
            None
        }
    }
}
