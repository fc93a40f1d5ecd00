//! Cache Entry Module
//!
//! Defines a single cached file: its bytes, the disk metadata they were read
//! with, and the last time a reader or an update touched it.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

// == File Metadata ==
/// Modification time and size of a file as observed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Size in bytes
    pub len: u64,
}

impl FileMeta {
    /// Builds metadata from a filesystem stat result.
    ///
    /// Platforms without modification times report the Unix epoch.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            modified: DateTime::<Utc>::from(modified),
            len: metadata.len(),
        }
    }

    /// Returns true if `other` describes a different version of the file.
    pub fn differs_from(&self, other: &FileMeta) -> bool {
        self.modified != other.modified || self.len != other.len
    }
}

// == Cached File ==
/// File content paired with the metadata it was read under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    /// Raw file bytes
    pub content: Bytes,
    /// Metadata captured when the bytes were read
    pub meta: FileMeta,
}

impl CachedFile {
    /// Reads a regular file from disk.
    ///
    /// Returns `Ok(None)` when the file does not exist or is not a regular
    /// file. Any other I/O failure is returned as an error.
    pub async fn read(path: &Path) -> io::Result<Option<Self>> {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let mut buf = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut buf).await?;

        // The file may have grown or shrunk between stat and read.
        let mut meta = FileMeta::from_metadata(&metadata);
        meta.len = buf.len() as u64;

        Ok(Some(Self {
            content: Bytes::from(buf),
            meta,
        }))
    }

    /// Length of the content in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns true if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// == Entry State ==
/// What an entry currently knows about its backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// File content is cached
    Present(CachedFile),
    /// File was absent at the last check (negative cache)
    Missing,
    /// Old content was released and new content is being loaded
    Reloading,
}

impl EntryState {
    fn size_bytes(&self) -> u64 {
        match self {
            EntryState::Present(file) => file.len(),
            EntryState::Missing | EntryState::Reloading => 0,
        }
    }
}

// == Cache Entry ==
/// A single cached file, shared between the store map and in-flight readers.
///
/// Content and metadata live behind one lock so they always change together.
#[derive(Debug)]
pub struct CacheEntry {
    path: PathBuf,
    state: RwLock<EntryState>,
    /// Monotonic milliseconds of the last read or update
    last_touch_ms: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry holding freshly read content.
    pub fn new(path: impl Into<PathBuf>, file: CachedFile) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(EntryState::Present(file)),
            last_touch_ms: AtomicU64::new(monotonic_ms()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Get ==
    /// Returns a snapshot of the entry state and marks it as touched.
    pub async fn get(&self) -> EntryState {
        let state = self.state.read().await;
        self.touch();
        state.clone()
    }

    /// Returns a snapshot without refreshing the touch time.
    pub async fn peek(&self) -> EntryState {
        self.state.read().await.clone()
    }

    // == Swap ==
    /// Replaces content and metadata wholesale.
    ///
    /// Returns the size of the content that was replaced.
    pub async fn swap(&self, file: CachedFile) -> u64 {
        let mut state = self.state.write().await;
        let old = state.size_bytes();
        *state = EntryState::Present(file);
        self.touch();
        old
    }

    // == Invalidate ==
    /// Drops content and metadata and records the file as missing.
    ///
    /// Returns the number of bytes released.
    pub async fn invalidate(&self) -> u64 {
        let mut state = self.state.write().await;
        let old = state.size_bytes();
        *state = EntryState::Missing;
        old
    }

    /// Drops content ahead of a reload. Returns the number of bytes released.
    pub async fn release(&self) -> u64 {
        let mut state = self.state.write().await;
        let old = state.size_bytes();
        *state = EntryState::Reloading;
        old
    }

    // == Size ==
    /// Length of the currently cached content.
    pub async fn size_bytes(&self) -> u64 {
        self.state.read().await.size_bytes()
    }

    // == Staleness ==
    /// Time since the entry was last read or updated.
    pub fn idle_for(&self) -> Duration {
        let touched = self.last_touch_ms.load(Ordering::Acquire);
        Duration::from_millis(monotonic_ms().saturating_sub(touched))
    }

    /// Returns true if the entry has gone untouched for longer than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.idle_for() > ttl
    }

    fn touch(&self) {
        self.last_touch_ms.store(monotonic_ms(), Ordering::Release);
    }
}

// == Utility Functions ==
/// Milliseconds elapsed on a process-wide monotonic clock.
pub fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}
