//! Bounded File Backend Module
//!
//! Durable storage engine keeping one serialized value file per key under a
//! storage directory, with an ordered key-list sidecar used purely for FIFO
//! eviction bookkeeping, since the directory store exposes no ordering.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::backend::{FifoTracker, StorageBackend, UNBOUNDED};
use crate::config::BackendParams;
use crate::error::{CacheError, Result};
use crate::key::CacheKey;
use crate::stats::CacheStats;

// == File Name Suffixes ==
/// Suffix appended to the storage path to name the key-list sidecar.
const KEYLIST_SUFFIX: &str = ".keys";
/// Suffix appended to the storage path to name the key-list lock file.
const LOCK_SUFFIX: &str = ".lock";
/// Extension of the per-key value files inside the storage directory.
const ENTRY_EXTENSION: &str = "entry";

// == Bounded File Backend ==
/// On-disk storage with FIFO eviction bounded by entry count.
///
/// Values are serialized to one file per key (named by the hex SHA-256 of the
/// key, so arbitrary key strings map to valid file names). Insertion order is
/// persisted at `<path>.keys` on every mutating operation so that eviction
/// order survives restarts. Entries persist beyond the owning instance's
/// lifetime.
///
/// Expiration is not supported: the advisory ttl passed to `set` is ignored,
/// a documented weaker guarantee of this backend.
#[derive(Debug)]
pub struct BoundedFileBackend {
    /// Directory holding one value file per key
    store_dir: PathBuf,
    /// Key-list sidecar location (storage path + fixed suffix)
    keylist_path: PathBuf,
    /// Lock file guarding key-list mutation across processes
    lock_path: PathBuf,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Insertion-order bookkeeping, persisted on every mutation
    keylist: FifoTracker,
    /// Performance statistics
    stats: CacheStats,
}

impl BoundedFileBackend {
    // == Constructor ==
    /// Creates a backend rooted at `path`, creating the directory if needed.
    ///
    /// The persisted key-list is loaded if present (an absent or unreadable
    /// key-list is treated as empty, never as fatal) and eviction enforcement
    /// runs immediately, handling the case where `max_entries` was lowered
    /// since the last run.
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let store_dir = path.into();
        let keylist_path = PathBuf::from(format!("{}{}", store_dir.display(), KEYLIST_SUFFIX));
        let lock_path = PathBuf::from(format!("{}{}", store_dir.display(), LOCK_SUFFIX));

        fs::create_dir_all(&store_dir)?;

        let keylist = match fs::read(&keylist_path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(list) => list,
                Err(err) => {
                    warn!(
                        path = %keylist_path.display(),
                        error = %err,
                        "key-list unreadable, starting from an empty list"
                    );
                    FifoTracker::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => FifoTracker::new(),
            Err(err) => {
                warn!(
                    path = %keylist_path.display(),
                    error = %err,
                    "key-list unreadable, starting from an empty list"
                );
                FifoTracker::new()
            }
        };

        let mut backend = Self {
            store_dir,
            keylist_path,
            lock_path,
            max_entries,
            keylist,
            stats: CacheStats::new(),
        };

        // The limit may have been lowered since the key-list was written
        if backend.keylist.len() > backend.max_entries {
            let _lock = backend.lock_keylist()?;
            while backend.keylist.len() > backend.max_entries {
                backend.evict_oldest()?;
            }
            backend.dump_keylist()?;
        }

        info!(
            path = %backend.store_dir.display(),
            max_entries = backend.max_entries,
            "constructed bounded file backend"
        );
        backend.report_occupancy();

        Ok(backend)
    }

    // == From Params ==
    /// Creates a backend from declarative configuration parameters.
    ///
    /// A storage path is required; an absent `max_entries` defaults to
    /// unbounded. Parameters the file backend does not know are ignored.
    pub fn from_params(params: &BackendParams) -> Result<Box<dyn StorageBackend>> {
        let path = params.path.clone().ok_or_else(|| {
            CacheError::Configuration("file backend requires a storage path".to_string())
        })?;
        Ok(Box::new(Self::new(
            path,
            params.max_entries.unwrap_or(UNBOUNDED),
        )?))
    }

    // == Tracked Keys ==
    /// Iterates the persisted keys, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.keylist.iter()
    }

    // == Entry Path ==
    /// Maps a key to its value file inside the storage directory.
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_str().as_bytes());
        let digest = hasher.finalize();
        self.store_dir
            .join(format!("{digest:x}.{ENTRY_EXTENSION}"))
    }

    // == Key-List Lock ==
    /// Takes an exclusive lock guarding key-list mutation.
    ///
    /// The lock is released when the returned handle is dropped, at the end
    /// of the mutating call. Two processes sharing a storage path serialize
    /// their key-list updates through this lock.
    fn lock_keylist(&self) -> Result<File> {
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.lock_path)?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    // == Persist Key-List ==
    /// Writes the key-list sidecar, atomically via a temp-file rename.
    ///
    /// Runs on every mutating operation so that the on-disk order never drifts
    /// from the store for longer than the scope of one `set`/`delete` call.
    fn dump_keylist(&self) -> Result<()> {
        let tmp_path = PathBuf::from(format!("{}.tmp", self.keylist_path.display()));
        fs::write(&tmp_path, serde_json::to_vec(&self.keylist)?)?;
        fs::rename(&tmp_path, &self.keylist_path)?;
        Ok(())
    }

    // == Evict Oldest ==
    /// Deletes the oldest key from both the durable store and the key-list.
    fn evict_oldest(&mut self) -> Result<()> {
        if let Some(oldest) = self.keylist.pop_oldest() {
            remove_file_if_present(&self.entry_path(&oldest))?;
            self.stats.record_eviction();
            debug!(key = %oldest, "evicting oldest entry from file backend");
        }
        Ok(())
    }
}

impl StorageBackend for BoundedFileBackend {
    // == Get ==
    /// Reads a value file.
    ///
    /// A missing key is a miss, never an error; an unreadable or corrupt
    /// value file is also treated as a miss and logged.
    fn get(&mut self, key: &CacheKey) -> Option<Value> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.stats.record_hit();
                    Some(value)
                }
                Err(err) => {
                    warn!(
                        key = %key,
                        path = %path.display(),
                        error = %err,
                        "stored value unreadable, treating as a miss"
                    );
                    self.stats.record_miss();
                    None
                }
            },
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(
                        key = %key,
                        path = %path.display(),
                        error = %err,
                        "stored value unreadable, treating as a miss"
                    );
                }
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Writes a value to the durable store.
    ///
    /// For a new key: oldest keys are evicted while the list would exceed
    /// `max_entries` with the new key included, the new key is appended and
    /// the key-list persisted, then the value file is written. For an
    /// existing key the value is overwritten in place without changing its
    /// position in the eviction order.
    fn set(&mut self, key: &CacheKey, value: Value, _ttl: Option<Duration>) -> Result<()> {
        let payload = serde_json::to_vec(&value)?;

        if !self.keylist.contains(key) {
            let _lock = self.lock_keylist()?;
            while !self.keylist.is_empty() && self.keylist.len() + 1 > self.max_entries {
                self.evict_oldest()?;
            }
            self.keylist.record(key);
            self.dump_keylist()?;
        }

        fs::write(self.entry_path(key), payload)?;
        self.stats.set_total_entries(self.keylist.len());
        Ok(())
    }

    // == Delete ==
    /// Removes a value file and its key-list slot.
    ///
    /// Deleting an absent key is a no-op; the key-list is persisted either
    /// way so restarts observe the deletion.
    fn delete(&mut self, key: &CacheKey) -> Result<()> {
        let _lock = self.lock_keylist()?;
        remove_file_if_present(&self.entry_path(key))?;
        self.keylist.remove(key);
        self.dump_keylist()?;
        self.stats.set_total_entries(self.keylist.len());
        Ok(())
    }

    // == Length ==
    fn len(&self) -> usize {
        self.keylist.len()
    }

    // == Stats ==
    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.keylist.len());
        stats
    }

    // == Report Occupancy ==
    fn report_occupancy(&self) {
        info!(
            entries = self.keylist.len(),
            max_entries = self.max_entries,
            path = %self.store_dir.display(),
            "file backend occupancy"
        );
    }
}

// == Utility Functions ==
/// Removes a file, tolerating its absence.
fn remove_file_if_present(path: &std::path::Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
