//! Cache Key Module
//!
//! Derives deterministic string keys from a namespace, a function name, and
//! the string forms of call arguments.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Cache Key ==
/// An opaque cache key.
///
/// Keys are compared by equality only; the total ordering exists for
/// persistence bookkeeping. Identical (namespace, function, arguments)
/// tuples always produce identical keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// == Key Generator ==
/// Builds cache keys for one (namespace, function) pair.
///
/// The key is the concatenation of the namespace, the function name, the
/// string form of each positional argument in call order, and each keyword
/// `name=value` pair.
///
/// Keyword pairs are sorted by name before concatenation, so two calls with
/// the same keyword arguments in different order map to the same key.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    namespace: String,
    function: String,
}

impl KeyGenerator {
    // == Constructor ==
    /// Creates a generator scoped to a namespace and a function name.
    pub fn new(namespace: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            function: function.into(),
        }
    }

    // == Generate ==
    /// Derives the key for one call.
    ///
    /// # Arguments
    /// * `args` - String forms of the positional arguments, in call order
    /// * `kwargs` - String forms of the keyword `(name, value)` pairs
    pub fn generate(&self, args: &[String], kwargs: &[(String, String)]) -> CacheKey {
        let mut key = format!("{}_{}", self.namespace, self.function);
        for arg in args {
            key.push('_');
            key.push_str(arg);
        }
        if !kwargs.is_empty() {
            let mut pairs: Vec<&(String, String)> = kwargs.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, value) in pairs {
                key.push_str("__");
                key.push_str(name);
                key.push('=');
                key.push_str(value);
            }
        }
        CacheKey(key)
    }
}

// == Key Source ==
/// Converts typed call arguments into the string forms the key is built from.
///
/// Tuples of `Display` values map to positional arguments; callers using
/// keyword-style arguments implement `keyword` directly.
pub trait KeySource {
    /// String forms of the positional arguments, in call order.
    fn positional(&self) -> Vec<String> {
        Vec::new()
    }

    /// String forms of the keyword `(name, value)` pairs.
    fn keyword(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

impl KeySource for () {}

impl<A: fmt::Display> KeySource for (A,) {
    fn positional(&self) -> Vec<String> {
        vec![self.0.to_string()]
    }
}

impl<A: fmt::Display, B: fmt::Display> KeySource for (A, B) {
    fn positional(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl<A: fmt::Display, B: fmt::Display, C: fmt::Display> KeySource for (A, B, C) {
    fn positional(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl<A: fmt::Display, B: fmt::Display, C: fmt::Display, D: fmt::Display> KeySource
    for (A, B, C, D)
{
    fn positional(&self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}
