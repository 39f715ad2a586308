//! FIFO Tracker Module
//!
//! Tracks insertion order for FIFO cache eviction.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

// == FIFO Tracker ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Unlike an LRU tracker there is no notion of touching: recording a key that
/// is already tracked keeps it in its original position, so access recency
/// never protects an entry from eviction.
///
/// The tracker is serializable because the on-disk backend persists it as its
/// key-list sidecar.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FifoTracker {
    /// Keys in insertion order
    order: VecDeque<CacheKey>,
}

impl FifoTracker {
    // == Constructor ==
    /// Creates a new empty FIFO tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Records a key as inserted (appends to the back).
    ///
    /// If the key is already tracked this is a no-op: overwrites do not
    /// rejuvenate a key.
    pub fn record(&mut self, key: &CacheKey) {
        if !self.contains(key) {
            self.order.push_back(key.clone());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Absent keys are tolerated.
    pub fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest-inserted key.
    ///
    /// Returns None if the tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<CacheKey> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    /// Returns the oldest-inserted key without removing it.
    pub fn peek_oldest(&self) -> Option<&CacheKey> {
        self.order.front()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.order.iter().any(|k| k == key)
    }

    // == Iterate ==
    /// Iterates the tracked keys, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.order.iter()
    }
}
