//! Configuration Module
//!
//! Declarative backend configuration: a variant name plus named parameters,
//! deserializable from a plain mapping. Unrecognized parameters are ignored
//! and absent capacity bounds default to unbounded.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// == Backend Variant Names ==
/// Variant name of the bounded in-memory backend.
pub const MEMORY_BACKEND: &str = "bounded_memory";
/// Variant name of the bounded on-disk backend.
pub const FILE_BACKEND: &str = "bounded_file";

// == Backend Config ==
/// Selects a backend variant and its parameters.
///
/// Deserializes from a flat mapping, e.g.
/// `{"backend": "bounded_memory", "max_entries": 100}`; keys the selected
/// backend does not know are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registered backend variant name
    pub backend: String,
    /// Named backend parameters
    #[serde(flatten)]
    pub params: BackendParams,
}

// == Backend Params ==
/// Named backend parameters. Every bound is optional; absent bounds mean
/// "unbounded".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendParams {
    /// Maximum number of entries
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Maximum aggregate value size in bytes (memory backend only)
    #[serde(default)]
    pub max_bytes: Option<usize>,
    /// Storage path (file backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl BackendConfig {
    // == Preset Configurations ==
    /// Memory backend bounded to roughly 20 MB of cached values.
    pub fn default_memory() -> Self {
        Self {
            backend: MEMORY_BACKEND.to_string(),
            params: BackendParams {
                max_bytes: Some(20_000 * 1024),
                ..BackendParams::default()
            },
        }
    }

    /// Small memory backend for tests and tightly bounded instances.
    pub fn small_memory() -> Self {
        Self {
            backend: MEMORY_BACKEND.to_string(),
            params: BackendParams {
                max_entries: Some(20),
                max_bytes: Some(20 * 1024),
                ..BackendParams::default()
            },
        }
    }

    /// File backend under the system temp directory, bounded to 2000 keys.
    pub fn default_file() -> Self {
        Self {
            backend: FILE_BACKEND.to_string(),
            params: BackendParams {
                max_entries: Some(2000),
                path: Some(env::temp_dir().join("memo_cache.store")),
                ..BackendParams::default()
            },
        }
    }

    /// Small file backend under the system temp directory, bounded to 20 keys.
    pub fn small_file() -> Self {
        Self {
            backend: FILE_BACKEND.to_string(),
            params: BackendParams {
                max_entries: Some(20),
                path: Some(env::temp_dir().join("memo_cache.small.store")),
                ..BackendParams::default()
            },
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::default_memory()
    }
}
