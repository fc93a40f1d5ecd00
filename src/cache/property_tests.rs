//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the capacity accounting invariants against random
//! sequences of lookups and on-disk edits.

use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::cache::{CacheStore, EntryState};

// == Test Configuration ==
const TEST_MAX_FILE_SIZE: u64 = 500;
const TEST_MAX_CAPACITY: u64 = 1000;
const TEST_FILE_COUNT: usize = 6;
const LONG_INTERVAL: Duration = Duration::from_secs(3600);

// == Strategies ==
/// Operations applied to a small pool of files
#[derive(Debug, Clone)]
enum FileOp {
    Lookup { file: usize },
    Write { file: usize, size: usize },
    Remove { file: usize },
    Scan,
}

fn file_op_strategy() -> impl Strategy<Value = FileOp> {
    prop_oneof![
        4 => (0..TEST_FILE_COUNT).prop_map(|file| FileOp::Lookup { file }),
        2 => (0..TEST_FILE_COUNT, 0usize..700).prop_map(|(file, size)| FileOp::Write { file, size }),
        1 => (0..TEST_FILE_COUNT).prop_map(|file| FileOp::Remove { file }),
        1 => Just(FileOp::Scan),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn write_versioned(path: &Path, size: usize, version: u64) {
    fs::write(path, vec![b'v'; size]).unwrap();
    // Distinct mtimes per write so every edit is observable
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + version))
        .unwrap();
}

/// Checks used bytes against the entries and both limits.
async fn check_accounting(store: &CacheStore) -> Result<(), TestCaseError> {
    let entries: Vec<_> = store.inner.read().await.entries.values().cloned().collect();
    let used = store.used_bytes().await;

    let mut total = 0;
    for entry in entries {
        let size = entry.size_bytes().await;
        prop_assert!(size <= TEST_MAX_FILE_SIZE, "entry of {} bytes over file limit", size);
        total += size;
    }
    prop_assert_eq!(used, total, "used bytes drifted from entry sizes");
    prop_assert!(used <= TEST_MAX_CAPACITY, "used bytes {} over capacity", used);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // *For any* sequence of lookups, edits, deletions and scans, the cache's
    // used bytes SHALL equal the sum of entry sizes and stay within both limits.
    #[test]
    fn prop_accounting_invariants(ops in prop::collection::vec(file_op_strategy(), 1..40)) {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..TEST_FILE_COUNT)
            .map(|i| dir.path().join(format!("file{}.bin", i)))
            .collect();

        runtime().block_on(async {
            let store = Arc::new(CacheStore::new(TEST_MAX_FILE_SIZE, TEST_MAX_CAPACITY, LONG_INTERVAL));
            store.set_enabled(true).await;
            let mut version = 0;

            for op in ops {
                match op {
                    FileOp::Lookup { file } => {
                        let _ = store.lookup(&paths[file]).await;
                    }
                    FileOp::Write { file, size } => {
                        version += 1;
                        write_versioned(&paths[file], size, version);
                    }
                    FileOp::Remove { file } => {
                        let _ = fs::remove_file(&paths[file]);
                    }
                    FileOp::Scan => {
                        store.run_cycle().await;
                    }
                }
                check_accounting(&store).await?;
            }

            store.shutdown().await;
            prop_assert!(store.is_empty().await);
            prop_assert_eq!(store.used_bytes().await, 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // *For any* file within both limits, a lookup SHALL return exactly the
    // bytes on disk, and after a scan the cached copy SHALL match the disk.
    #[test]
    fn prop_roundtrip_after_edit(
        first in prop::collection::vec(any::<u8>(), 0..=500),
        second in prop::collection::vec(any::<u8>(), 0..=500),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("asset.bin");

        runtime().block_on(async {
            let store = Arc::new(CacheStore::new(TEST_MAX_FILE_SIZE, TEST_MAX_CAPACITY, LONG_INTERVAL));
            store.set_enabled(true).await;

            fs::write(&path, &first).unwrap();
            let served = store.lookup(&path).await.unwrap();
            prop_assert_eq!(&served.content[..], &first[..]);

            fs::write(&path, &second).unwrap();
            fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(SystemTime::now() + Duration::from_secs(10))
                .unwrap();
            store.run_cycle().await;

            let entry = store.inner.read().await.entries.get(&path).cloned().unwrap();
            match entry.peek().await {
                EntryState::Present(file) => {
                    prop_assert_eq!(&file.content[..], &second[..]);
                    prop_assert_eq!(file.meta.len, second.len() as u64);
                }
                other => prop_assert!(false, "unexpected entry state {:?}", other),
            }

            store.shutdown().await;
            Ok::<(), TestCaseError>(())
        })?;
    }
}
