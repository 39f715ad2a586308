//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with size accounting
//! and optional expiration.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
///
/// Entries are owned exclusively by their storage backend; they are created
/// on a cache miss, replaced on overwrite, and destroyed by delete or
/// eviction.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// Approximate payload size in bytes
    pub size_bytes: usize,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional expiration.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `ttl` - Optional time-to-live
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl.map(|ttl| now + ttl.as_millis() as u64);
        let size_bytes = approx_size(&value);

        Self {
            value,
            size_bytes,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time; entries without expiration never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

/// Estimates the in-memory footprint of a payload in bytes.
///
/// The estimate is approximate but monotonic: a value holding more data is
/// never estimated smaller than a simpler value holding less.
pub fn approx_size(value: &Value) -> usize {
    match value {
        Value::Null => 8,
        Value::Bool(_) => 9,
        Value::Number(_) => 16,
        Value::String(s) => 24 + s.len(),
        Value::Array(items) => 24 + items.iter().map(approx_size).sum::<usize>(),
        Value::Object(map) => {
            24 + map
                .iter()
                .map(|(name, item)| 24 + name.len() + approx_size(item))
                .sum::<usize>()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(json!("test_value"), None);

        assert_eq!(entry.value, json!("test_value"));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(json!("test_value"), Some(Duration::from_secs(60)));

        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!("test_value"), Some(Duration::from_millis(50)));

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!("test"),
            size_bytes: 0,
            created_at: now,
            expires_at: Some(now), // Expires exactly at creation time
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_approx_size_grows_with_string_length() {
        let small = approx_size(&json!("ab"));
        let large = approx_size(&json!("ab".repeat(100)));
        assert!(large > small);
    }

    #[test]
    fn test_approx_size_grows_with_array_length() {
        let small = approx_size(&json!([1.0, 2.0]));
        let large = approx_size(&json!(vec![1.0; 64]));
        assert!(large > small);
    }

    #[test]
    fn test_approx_size_object_counts_field_names() {
        let plain = approx_size(&json!({"a": 1}));
        let wordy = approx_size(&json!({"a_much_longer_field_name": 1}));
        assert!(wordy > plain);
    }
}
