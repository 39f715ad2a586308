//! Memoization Module
//!
//! The method-level memoization layer: a wrapper intercepting calls to an
//! expensive instance method, consulting the cache region owned by the
//! receiving instance, and returning cached or freshly computed results.

use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::backend::BackendRegistry;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::key::{KeyGenerator, KeySource};
use crate::region::CacheRegion;

// == Cache Owner Trait ==
/// The capabilities an instance must expose to have its methods memoized.
///
/// The memoizing wrapper depends only on this trait, never on a concrete
/// owner type. [`Cacheable`] is the stock implementation; types embed it and
/// delegate, or implement the trait directly.
pub trait CacheOwner {
    /// The region holding this instance's cached results.
    ///
    /// The region sits behind a mutex so that concurrent calls on the same
    /// instance serialize their `get_or_create` sections instead of racing
    /// the computation.
    fn cache_region(&self) -> &Mutex<CacheRegion>;

    /// The key prefix isolating this instance's entries.
    fn namespace(&self) -> &str;

    /// Default staleness bound attached to entries this instance stores.
    fn expiration(&self) -> Option<Duration> {
        None
    }
}

// == Memoized ==
/// A memoizing wrapper around one instance method.
///
/// Holds the wrapped computation and its declared name; the call site invokes
/// it with an explicit receiver. The wrapped method's signature is unchanged:
/// it still receives the receiver and its typed arguments.
pub struct Memoized<O, A, T> {
    /// Declared name of the wrapped method, scoped by the owner's namespace
    name: &'static str,
    /// The wrapped computation
    function: fn(&O, &A) -> T,
}

impl<O, A, T> Memoized<O, A, T>
where
    O: CacheOwner,
    A: KeySource,
    T: Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Wraps a method under its declared name.
    ///
    /// Same-named methods of unrelated types never collide: keys are scoped
    /// by the owner's namespace, not by the function identity alone.
    pub const fn new(name: &'static str, function: fn(&O, &A) -> T) -> Self {
        Self { name, function }
    }

    // == Call ==
    /// Invokes the wrapped method through the owner's cache.
    ///
    /// Builds the key from (namespace, method name, arguments), then
    /// delegates to the owner's region: a live cached value is returned
    /// without running the method; otherwise the method runs once and its
    /// result is stored. Each actual computation is logged at debug severity.
    pub fn call(&self, owner: &O, args: A) -> Result<T> {
        let keygen = KeyGenerator::new(owner.namespace(), self.name);
        let key = keygen.generate(&args.positional(), &args.keyword());

        let mut region = owner.cache_region().lock();
        region.get_or_create(&key, owner.expiration(), || {
            debug!(
                owner = type_name::<O>(),
                method = self.name,
                "creating new cache entry"
            );
            (self.function)(owner, &args)
        })
    }
}

// == Cacheable ==
/// Per-instance cache ownership: a dedicated region, a namespace unique to
/// the instance, and a default expiration policy.
///
/// Two instances of the same type never share cache entries by default; their
/// namespaces embed distinct identity tokens even when the instances are
/// value-equal. Sharing a region requires the explicit [`Cacheable::with_region`]
/// constructor, and even then namespaces keep the instances' entries apart.
#[derive(Debug)]
pub struct Cacheable {
    /// The region holding this instance's entries
    region: Arc<Mutex<CacheRegion>>,
    /// Type name plus per-instance identity token
    namespace: String,
    /// Default staleness bound for stored entries
    expiration: Option<Duration>,
}

impl Cacheable {
    // == Constructor ==
    /// Creates cache ownership for one instance from a declarative backend
    /// configuration.
    ///
    /// # Arguments
    /// * `type_name` - Owning type's name, the first namespace component
    /// * `config` - Backend variant plus named parameters
    /// * `registry` - Registry resolving the variant name
    pub fn new(
        type_name: &str,
        config: &BackendConfig,
        registry: &BackendRegistry,
    ) -> Result<Self> {
        let region = CacheRegion::from_config(config, registry)?;
        Ok(Self::with_region(type_name, Arc::new(Mutex::new(region))))
    }

    // == With Region ==
    /// Creates cache ownership over an explicitly shared region.
    ///
    /// The namespace is still unique per instance, so instances sharing a
    /// region keep their entries apart.
    pub fn with_region(type_name: &str, region: Arc<Mutex<CacheRegion>>) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self {
            region,
            namespace: format!("{type_name}_{token}"),
            expiration: None,
        }
    }

    // == With Expiration ==
    /// Sets the default staleness bound attached to stored entries.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    // == Shared Region ==
    /// Handle for explicitly sharing this instance's region with another.
    pub fn shared_region(&self) -> Arc<Mutex<CacheRegion>> {
        Arc::clone(&self.region)
    }
}

impl CacheOwner for Cacheable {
    fn cache_region(&self) -> &Mutex<CacheRegion> {
        &self.region
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn expiration(&self) -> Option<Duration> {
        self.expiration
    }
}
