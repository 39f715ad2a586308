//! Bounded Memory Backend Module
//!
//! In-memory storage engine combining HashMap storage with FIFO insertion
//! tracking, bounded by entry count and approximate aggregate byte size.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::backend::{CacheEntry, FifoTracker, StorageBackend, UNBOUNDED};
use crate::config::BackendParams;
use crate::error::Result;
use crate::key::CacheKey;
use crate::stats::CacheStats;

// == Bounded Memory Backend ==
/// In-memory storage with FIFO eviction and per-entry expiration.
///
/// Entries are evicted oldest-first whenever admitting a new entry would
/// exceed `max_entries` or `max_bytes`; access recency never protects an
/// entry. A single entry larger than `max_bytes` on its own is still admitted
/// once eviction has emptied the store — oversized entries are accepted, not
/// rejected.
#[derive(Debug)]
pub struct BoundedMemoryBackend {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry>,
    /// Insertion-order tracker for eviction
    order: FifoTracker,
    /// Approximate aggregate size of all stored values
    total_bytes: usize,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum aggregate size in bytes
    max_bytes: usize,
    /// Performance statistics
    stats: CacheStats,
}

impl BoundedMemoryBackend {
    // == Constructor ==
    /// Creates a new BoundedMemoryBackend with the given capacity limits.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries ([`UNBOUNDED`] for none)
    /// * `max_bytes` - Maximum aggregate value size ([`UNBOUNDED`] for none)
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        info!(
            max_entries,
            max_bytes, "constructed bounded memory backend"
        );
        Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            total_bytes: 0,
            max_entries,
            max_bytes,
            stats: CacheStats::new(),
        }
    }

    // == From Params ==
    /// Creates a backend from declarative configuration parameters.
    ///
    /// Absent bounds default to unbounded; parameters the memory backend does
    /// not know are ignored.
    pub fn from_params(params: &BackendParams) -> Result<Box<dyn StorageBackend>> {
        Ok(Box::new(Self::new(
            params.max_entries.unwrap_or(UNBOUNDED),
            params.max_bytes.unwrap_or(UNBOUNDED),
        )))
    }

    // == Aggregate Size ==
    /// Returns the approximate aggregate size of all stored values in bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    // == Evict Oldest ==
    /// Removes the oldest live entry.
    ///
    /// Skips stale tracker slots left behind by an in-flight overwrite.
    fn evict_oldest(&mut self) {
        while let Some(oldest) = self.order.pop_oldest() {
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.total_bytes -= evicted.size_bytes;
                self.stats.record_eviction();
                debug!(key = %oldest, "evicting oldest entry from memory backend");
                return;
            }
        }
    }

    // == Drop Entry ==
    /// Removes one entry and its tracker slot, keeping byte accounting in sync.
    fn drop_entry(&mut self, key: &CacheKey) -> bool {
        match self.entries.remove(key) {
            Some(removed) => {
                self.total_bytes -= removed.size_bytes;
                self.order.remove(key);
                true
            }
            None => false,
        }
    }
}

impl StorageBackend for BoundedMemoryBackend {
    // == Get ==
    /// Retrieves a value if present and not expired.
    ///
    /// Expired entries are removed and reported as misses. The insertion
    /// order is not updated: reads never protect an entry from eviction.
    fn get(&mut self, key: &CacheKey) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.drop_entry(key);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or overwrites a value.
    ///
    /// Before admission, oldest entries are evicted while the store would
    /// exceed `max_entries` or `max_bytes` with the new entry included, until
    /// admission is safe or the store is empty. Overwriting an existing key
    /// keeps its position in the eviction order.
    fn set(&mut self, key: &CacheKey, value: Value, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);

        // Release the old value first so its size does not count against the
        // new one; the key keeps its slot in the eviction order.
        if let Some(previous) = self.entries.remove(key) {
            self.total_bytes -= previous.size_bytes;
        }

        while !self.entries.is_empty()
            && (self.entries.len() + 1 > self.max_entries
                || self.total_bytes + entry.size_bytes > self.max_bytes)
        {
            self.evict_oldest();
        }

        self.order.record(key);
        self.total_bytes += entry.size_bytes;
        self.entries.insert(key.clone(), entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key. Deleting an absent key is a no-op.
    fn delete(&mut self, key: &CacheKey) -> Result<()> {
        self.drop_entry(key);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Length ==
    fn len(&self) -> usize {
        self.entries.len()
    }

    // == Stats ==
    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Report Occupancy ==
    fn report_occupancy(&self) {
        info!(
            entries = self.entries.len(),
            max_entries = self.max_entries,
            bytes = self.total_bytes,
            max_bytes = self.max_bytes,
            "memory backend occupancy"
        );
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn key(raw: &str) -> CacheKey {
        CacheKey::from(raw)
    }

    #[test]
    fn test_backend_new() {
        let backend = BoundedMemoryBackend::new(100, UNBOUNDED);
        assert_eq!(backend.len(), 0);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_backend_set_and_get() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        let value = backend.get(&key("key1")).unwrap();

        assert_eq!(value, json!("value1"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_backend_get_nonexistent() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);
        assert!(backend.get(&key("nonexistent")).is_none());
    }

    #[test]
    fn test_backend_delete() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.delete(&key("key1")).unwrap();

        assert!(backend.is_empty());
        assert_eq!(backend.total_bytes(), 0);
        assert!(backend.get(&key("key1")).is_none());
    }

    #[test]
    fn test_backend_delete_is_idempotent() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend.delete(&key("nonexistent")).unwrap();
        backend.delete(&key("nonexistent")).unwrap();

        assert!(backend.is_empty());
    }

    #[test]
    fn test_backend_overwrite() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.set(&key("key1"), json!("value2"), None).unwrap();

        assert_eq!(backend.get(&key("key1")).unwrap(), json!("value2"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_backend_overwrite_keeps_eviction_position() {
        let mut backend = BoundedMemoryBackend::new(2, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.set(&key("key2"), json!("value2"), None).unwrap();

        // Overwriting key1 must not rejuvenate it
        backend.set(&key("key1"), json!("value1b"), None).unwrap();
        backend.set(&key("key3"), json!("value3"), None).unwrap();

        assert!(backend.get(&key("key1")).is_none());
        assert!(backend.get(&key("key2")).is_some());
        assert!(backend.get(&key("key3")).is_some());
    }

    #[test]
    fn test_backend_fifo_eviction() {
        let mut backend = BoundedMemoryBackend::new(2, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.set(&key("key2"), json!("value2"), None).unwrap();
        backend.set(&key("key3"), json!("value3"), None).unwrap();

        assert_eq!(backend.len(), 2);
        assert!(backend.get(&key("key1")).is_none());
        assert!(backend.get(&key("key2")).is_some());
        assert!(backend.get(&key("key3")).is_some());
    }

    #[test]
    fn test_backend_get_does_not_protect_from_eviction() {
        let mut backend = BoundedMemoryBackend::new(2, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.set(&key("key2"), json!("value2"), None).unwrap();

        // Reading key1 must not move it out of eviction position
        backend.get(&key("key1")).unwrap();
        backend.set(&key("key3"), json!("value3"), None).unwrap();

        assert!(backend.get(&key("key1")).is_none());
        assert!(backend.get(&key("key2")).is_some());
    }

    #[test]
    fn test_backend_byte_limit_eviction() {
        // Each value is ~24 + 64 bytes; three of them cannot fit in 200
        let mut backend = BoundedMemoryBackend::new(UNBOUNDED, 200);

        backend.set(&key("key1"), json!("x".repeat(64)), None).unwrap();
        backend.set(&key("key2"), json!("y".repeat(64)), None).unwrap();
        backend.set(&key("key3"), json!("z".repeat(64)), None).unwrap();

        assert!(backend.total_bytes() <= 200);
        assert!(backend.get(&key("key1")).is_none());
        assert!(backend.get(&key("key3")).is_some());
    }

    #[test]
    fn test_backend_oversized_entry_admitted_after_emptying() {
        let mut backend = BoundedMemoryBackend::new(UNBOUNDED, 100);

        backend.set(&key("small"), json!("v"), None).unwrap();

        // Larger than the whole byte limit on its own
        backend.set(&key("huge"), json!("x".repeat(500)), None).unwrap();

        assert_eq!(backend.len(), 1);
        assert!(backend.get(&key("small")).is_none());
        assert!(backend.get(&key("huge")).is_some());
    }

    #[test]
    fn test_backend_expired_entry_is_a_miss() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend
            .set(&key("key1"), json!("value1"), Some(Duration::from_millis(40)))
            .unwrap();
        assert!(backend.get(&key("key1")).is_some());

        sleep(Duration::from_millis(70));

        assert!(backend.get(&key("key1")).is_none());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_backend_stats() {
        let mut backend = BoundedMemoryBackend::new(100, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        let _ = backend.get(&key("key1")); // hit
        let _ = backend.get(&key("nonexistent")); // miss

        let stats = backend.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_backend_eviction_counted() {
        let mut backend = BoundedMemoryBackend::new(1, UNBOUNDED);

        backend.set(&key("key1"), json!("value1"), None).unwrap();
        backend.set(&key("key2"), json!("value2"), None).unwrap();

        assert_eq!(backend.stats().evictions, 1);
    }

    #[test]
    fn test_backend_from_params_defaults_unbounded() {
        let params = BackendParams::default();
        let mut backend = BoundedMemoryBackend::from_params(&params).unwrap();

        for i in 0..64 {
            backend
                .set(&key(&format!("key{i}")), json!(i), None)
                .unwrap();
        }
        assert_eq!(backend.len(), 64);
    }
}
