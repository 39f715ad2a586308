//! Cache Region Module
//!
//! Wraps a storage backend behind the `get_or_create` contract: the cached
//! computation runs at most once per key per region instance.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{BackendRegistry, StorageBackend};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::key::CacheKey;
use crate::stats::CacheStats;

// == Cache Region ==
/// The logical owner of one backend instance.
///
/// A region's lifetime equals its owning instance's lifetime; dropping the
/// region releases an in-memory backend's contents, while an on-disk
/// backend's contents persist by design.
#[derive(Debug)]
pub struct CacheRegion {
    /// The bounded store holding this region's entries
    backend: Box<dyn StorageBackend>,
}

impl CacheRegion {
    // == Constructor ==
    /// Creates a region owning the given backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    // == From Config ==
    /// Creates a region from a declarative backend configuration.
    ///
    /// Fails immediately on an unknown variant name or invalid parameters.
    pub fn from_config(config: &BackendConfig, registry: &BackendRegistry) -> Result<Self> {
        Ok(Self::new(registry.construct(config)?))
    }

    // == Get Or Create ==
    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// If the backend holds a live value, `compute` is not invoked; otherwise
    /// `compute` runs exactly once, its result is stored via the backend, and
    /// the freshly computed value is returned.
    ///
    /// `expiration` is advisory staleness information attached to this call;
    /// backends without time-based expiration ignore it.
    ///
    /// # Arguments
    /// * `key` - The cache key for this computation
    /// * `expiration` - Optional time-to-live for the stored result
    /// * `compute` - The deferred computation producing the value
    pub fn get_or_create<T, F>(
        &mut self,
        key: &CacheKey,
        expiration: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(stored) = self.backend.get(key) {
            return Ok(serde_json::from_value(stored)?);
        }

        let produced = compute();
        let value = serde_json::to_value(&produced)?;
        self.backend.set(key, value, expiration)?;
        Ok(produced)
    }

    // == Invalidate ==
    /// Removes the entry for `key`, forcing the next call to recompute.
    ///
    /// Invalidating an absent key is a no-op.
    pub fn invalidate(&mut self, key: &CacheKey) -> Result<()> {
        self.backend.delete(key)
    }

    // == Length ==
    /// Returns the number of entries currently held by the backend.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    // == Is Empty ==
    /// Returns true if the backend holds no entries.
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    // == Stats ==
    /// Returns the backend's current performance counters.
    pub fn stats(&self) -> CacheStats {
        self.backend.stats()
    }

    // == Report Occupancy ==
    /// Logs the backend's occupancy against its limits.
    pub fn report_occupancy(&self) {
        self.backend.report_occupancy()
    }
}
