//! Backend Registry Module
//!
//! Maps backend variant names to constructor functions. A registry is built
//! once at startup and passed explicitly into region construction; there is
//! no process-wide mutable registration.

use std::collections::HashMap;

use crate::backend::{BoundedFileBackend, BoundedMemoryBackend, StorageBackend};
use crate::config::{BackendConfig, BackendParams, FILE_BACKEND, MEMORY_BACKEND};
use crate::error::{CacheError, Result};

// == Backend Constructor ==
/// Builds a backend from declarative parameters.
pub type BackendConstructor = fn(&BackendParams) -> Result<Box<dyn StorageBackend>>;

// == Backend Registry ==
/// Registry of named backend variants.
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    constructors: HashMap<String, BackendConstructor>,
}

impl BackendRegistry {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    // == With Defaults ==
    /// Creates a registry with the built-in variants registered:
    /// [`MEMORY_BACKEND`] and [`FILE_BACKEND`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MEMORY_BACKEND, BoundedMemoryBackend::from_params);
        registry.register(FILE_BACKEND, BoundedFileBackend::from_params);
        registry
    }

    // == Register ==
    /// Registers a constructor under a variant name, replacing any previous
    /// registration for that name.
    pub fn register(&mut self, name: impl Into<String>, constructor: BackendConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    // == Construct ==
    /// Builds the backend selected by a configuration.
    ///
    /// An unknown variant name fails here, at construction, rather than being
    /// deferred to first use.
    pub fn construct(&self, config: &BackendConfig) -> Result<Box<dyn StorageBackend>> {
        match self.constructors.get(&config.backend) {
            Some(constructor) => constructor(&config.params),
            None => Err(CacheError::UnknownBackend(config.backend.clone())),
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
