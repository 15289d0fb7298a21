//! Counter Store Backends
//!
//! - `MemoryCounterStore`: lock-free per-key CAS over atomics
//! - `FileCounterStore`: JSON snapshot, rewritten atomically on every swap

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game::identity::PlayerIdentity;
use crate::game::nonce::{CounterStore, StoreError, SwapResult};

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process counter store.
///
/// The map lock is only taken for writing on registration; swaps on
/// existing identities run under the shared read lock.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: RwLock<BTreeMap<PlayerIdentity, AtomicU64>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.counters.read().map(|c| c.len()).unwrap_or(0)
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CounterStore for MemoryCounterStore {
    fn register(&self, identity: &PlayerIdentity) -> Result<u64, StoreError> {
        let mut counters = self.counters.write().map_err(|_| StoreError::Poisoned)?;
        let counter = counters
            .entry(identity.clone())
            .or_insert_with(|| AtomicU64::new(0));
        Ok(counter.load(Ordering::SeqCst))
    }

    fn load(&self, identity: &PlayerIdentity) -> Result<Option<u64>, StoreError> {
        let counters = self.counters.read().map_err(|_| StoreError::Poisoned)?;
        Ok(counters.get(identity).map(|c| c.load(Ordering::SeqCst)))
    }

    fn compare_and_swap(
        &self,
        identity: &PlayerIdentity,
        expected: u64,
        new: u64,
    ) -> Result<SwapResult, StoreError> {
        let counters = self.counters.read().map_err(|_| StoreError::Poisoned)?;
        let Some(counter) = counters.get(identity) else {
            return Ok(SwapResult::Missing);
        };

        Ok(
            match counter.compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => SwapResult::Swapped,
                Err(current) => SwapResult::Stale { current },
            },
        )
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// On-disk snapshot format.
#[derive(Debug, Deserialize)]
struct CounterSnapshot {
    /// Snapshot format version.
    version: u8,
    /// Last consumed nonce per identity.
    counters: BTreeMap<PlayerIdentity, u64>,
}

const SNAPSHOT_VERSION: u8 = 1;

/// Durable counter store backed by a single JSON file.
///
/// Every successful swap rewrites the snapshot (temp file, fsync, rename)
/// before returning, so a consumed nonce survives a crash.
#[derive(Debug)]
pub struct FileCounterStore {
    path: PathBuf,
    counters: Mutex<BTreeMap<PlayerIdentity, u64>>,
}

impl FileCounterStore {
    /// Default snapshot file name inside a data directory.
    pub const FILE_NAME: &'static str = "nonces.json";

    /// Open a store, loading the snapshot if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let counters = if path.exists() {
            let bytes = fs::read(&path)?;
            let snapshot: CounterSnapshot = serde_json::from_slice(&bytes)?;
            if snapshot.version != SNAPSHOT_VERSION {
                warn!(version = snapshot.version, "nonce snapshot version differs, loading anyway");
            }
            snapshot.counters
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), identities = counters.len(), "opened nonce store");
        Ok(Self {
            path,
            counters: Mutex::new(counters),
        })
    }

    /// Open `nonces.json` inside a directory, creating the directory.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        fs::create_dir_all(dir.as_ref())?;
        Self::open(dir.as_ref().join(Self::FILE_NAME))
    }

    /// Snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, counters: &BTreeMap<PlayerIdentity, u64>) -> Result<(), StoreError> {
        let snapshot = CounterSnapshotRef {
            version: SNAPSHOT_VERSION,
            counters,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_dir(parent_dir(&self.path))?;
        Ok(())
    }
}

/// Directory holding `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Flush a directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Borrowed form of `CounterSnapshot` for writing without cloning.
#[derive(Serialize)]
struct CounterSnapshotRef<'a> {
    version: u8,
    counters: &'a BTreeMap<PlayerIdentity, u64>,
}

impl CounterStore for FileCounterStore {
    fn register(&self, identity: &PlayerIdentity) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(&last) = counters.get(identity) {
            return Ok(last);
        }

        counters.insert(identity.clone(), 0);
        if let Err(e) = self.persist(&counters) {
            counters.remove(identity);
            return Err(e);
        }
        Ok(0)
    }

    fn load(&self, identity: &PlayerIdentity) -> Result<Option<u64>, StoreError> {
        let counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(counters.get(identity).copied())
    }

    fn compare_and_swap(
        &self,
        identity: &PlayerIdentity,
        expected: u64,
        new: u64,
    ) -> Result<SwapResult, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::Poisoned)?;
        let current = match counters.get(identity) {
            Some(&current) => current,
            None => return Ok(SwapResult::Missing),
        };
        if current != expected {
            return Ok(SwapResult::Stale { current });
        }

        counters.insert(identity.clone(), new);
        if let Err(e) = self.persist(&counters) {
            // Keep memory in line with disk
            counters.insert(identity.clone(), current);
            return Err(e);
        }

        debug!(player = %identity, nonce = new, "nonce persisted");
        Ok(SwapResult::Swapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::nonce::{NonceSequencer, SequencerConfig};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn player(name: &str) -> PlayerIdentity {
        PlayerIdentity::parse(&format!("{name}@example.com")).unwrap()
    }

    #[test]
    fn test_memory_store_cas() {
        let store = MemoryCounterStore::new();
        let alice = player("alice");

        assert_eq!(store.compare_and_swap(&alice, 0, 1).unwrap(), SwapResult::Missing);

        store.register(&alice).unwrap();
        assert_eq!(store.compare_and_swap(&alice, 0, 1).unwrap(), SwapResult::Swapped);
        assert_eq!(
            store.compare_and_swap(&alice, 0, 1).unwrap(),
            SwapResult::Stale { current: 1 }
        );
        assert_eq!(store.load(&alice).unwrap(), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let alice = player("alice");

        {
            let store = FileCounterStore::open_in_dir(dir.path()).unwrap();
            store.register(&alice).unwrap();
            assert_eq!(store.compare_and_swap(&alice, 0, 1).unwrap(), SwapResult::Swapped);
            assert_eq!(store.compare_and_swap(&alice, 1, 2).unwrap(), SwapResult::Swapped);
        }

        let reopened = FileCounterStore::open_in_dir(dir.path()).unwrap();
        assert_eq!(reopened.load(&alice).unwrap(), Some(2));
        assert_eq!(reopened.register(&alice).unwrap(), 2);
    }

    #[test]
    fn test_file_store_stale_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open_in_dir(dir.path()).unwrap();
        let alice = player("alice");

        assert_eq!(store.compare_and_swap(&alice, 0, 1).unwrap(), SwapResult::Missing);
        store.register(&alice).unwrap();
        assert_eq!(
            store.compare_and_swap(&alice, 5, 6).unwrap(),
            SwapResult::Stale { current: 0 }
        );
    }

    #[test]
    fn test_file_store_snapshot_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open_in_dir(dir.path()).unwrap();
        store.register(&player("alice")).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["counters"]["alice@example.com"], 0);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open_in_dir(dir.path()).unwrap();
        let (alice, bob) = (player("alice"), player("bob"));
        store.register(&alice).unwrap();
        assert_eq!(store.compare_and_swap(&alice, 0, 1).unwrap(), SwapResult::Swapped);

        // A directory where the temp file goes makes every write fail
        let tmp = store.path().with_extension("json.tmp");
        fs::create_dir(&tmp).unwrap();

        assert!(matches!(store.compare_and_swap(&alice, 1, 2), Err(StoreError::Io(_))));
        assert_eq!(store.load(&alice).unwrap(), Some(1));
        assert!(matches!(store.register(&bob), Err(StoreError::Io(_))));
        assert_eq!(store.load(&bob).unwrap(), None);

        fs::remove_dir(&tmp).unwrap();
        assert_eq!(store.compare_and_swap(&alice, 1, 2).unwrap(), SwapResult::Swapped);

        let reopened = FileCounterStore::open(store.path()).unwrap();
        assert_eq!(reopened.load(&alice).unwrap(), Some(2));
        assert_eq!(reopened.load(&bob).unwrap(), None);
    }

    #[test]
    fn test_file_store_concurrent_nonces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open_in_dir(dir.path()).unwrap();
        let seq = Arc::new(NonceSequencer::new(store, SequencerConfig::default()));
        let alice = player("alice");
        seq.register(&alice).unwrap();

        let n = 16;
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let seq = Arc::clone(&seq);
                let alice = alice.clone();
                std::thread::spawn(move || seq.next_for(&alice).unwrap())
            })
            .collect();

        let nonces: BTreeSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(nonces, (1..=n).collect::<BTreeSet<u64>>());

        let reopened = FileCounterStore::open_in_dir(dir.path()).unwrap();
        assert_eq!(reopened.load(&alice).unwrap(), Some(n));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("nonces.json")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/var/lib/dice/nonces.json")), Path::new("/var/lib/dice"));

        let dir = tempfile::tempdir().unwrap();
        sync_dir(dir.path()).unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FileCounterStore::FILE_NAME);
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(FileCounterStore::open(&path), Err(StoreError::Serde(_))));
    }
}
