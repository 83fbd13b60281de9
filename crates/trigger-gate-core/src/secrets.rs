//! # Secret Resolution
//!
//! Resolves [`SecretRef`]s to secret bytes through a caller-supplied
//! [`SecretStore`], de-duplicating store calls within one inbound request via
//! a [`RequestCache`].
//!
//! The cache is an explicit handle: create one per inbound request, pass it
//! by reference through the chain, and drop it when the request completes.
//! It is deliberately not `Clone` so that it cannot leak into a second
//! request.

use crate::{InterceptorError, NotFoundError};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    sync::{PoisonError, RwLock},
};
use tracing::{debug, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Core Types
// ============================================================================

/// Reference to one scalar value inside a named secret
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(rename = "secretName")]
    pub name: String,

    #[serde(rename = "secretKey")]
    pub key: String,

    /// Defaults to the namespace of the event being processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretRef {
    /// Reference `key` inside secret `name` in the event's namespace
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            namespace: None,
        }
    }

    /// Pin the reference to an explicit namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Namespace to look the secret up in
    pub fn resolve_namespace<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => default_namespace,
        }
    }
}

/// Secret bytes, wiped from memory on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    /// Raw secret value, for immediate use only
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBytes")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl From<&str> for SecretBytes {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// Fields of one stored secret, keyed by field name
pub type SecretData = HashMap<String, SecretBytes>;

// ============================================================================
// Store interface
// ============================================================================

/// Failure reported by a [`SecretStore`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretStoreError {
    #[error("secret not found")]
    NotFound,

    #[error("secret store unavailable: {message}")]
    Unavailable { message: String },
}

/// Read-only access to stored secrets.
///
/// Implementations must tolerate concurrent reads from many requests.
pub trait SecretStore: Send + Sync {
    /// Fetch every field of secret `name` in `namespace`
    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError>;
}

// ============================================================================
// RequestCache
// ============================================================================

/// Identity of one cached secret value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

impl CacheKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secret/{}/{}/{}", self.namespace, self.name, self.key)
    }
}

/// Secret values resolved while processing one inbound request.
///
/// Safe for concurrent access, although the chain uses it sequentially.
#[derive(Default)]
pub struct RequestCache {
    entries: RwLock<HashMap<CacheKey, SecretBytes>>,
}

impl RequestCache {
    /// Create an empty cache for a new request
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached value
    pub fn get(&self, key: &CacheKey) -> Option<SecretBytes> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a resolved value, replacing any previous one
    pub fn insert(&self, key: CacheKey, value: SecretBytes) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache")
            .field("entries", &self.len())
            .finish()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve `secret_ref` to its bytes.
///
/// The namespace is the reference's own namespace when set, otherwise
/// `default_namespace`. A cache hit makes no store call; a miss makes exactly
/// one and populates the cache.
///
/// # Errors
///
/// - [`NotFoundError::Secret`] when the secret does not exist
/// - [`NotFoundError::SecretKey`] when the secret lacks the referenced field
/// - [`InterceptorError::StoreUnavailable`] when the store itself fails
#[instrument(skip(cache, store), fields(secret = %secret_ref.name, key = %secret_ref.key))]
pub fn resolve_secret(
    cache: &RequestCache,
    store: &dyn SecretStore,
    secret_ref: &SecretRef,
    default_namespace: &str,
) -> Result<SecretBytes, InterceptorError> {
    let namespace = secret_ref.resolve_namespace(default_namespace);
    let cache_key = CacheKey::new(namespace, &secret_ref.name, &secret_ref.key);

    if let Some(cached) = cache.get(&cache_key) {
        debug!(cache_key = %cache_key, "Secret served from request cache");
        return Ok(cached);
    }

    let data = store
        .get_secret(namespace, &secret_ref.name)
        .map_err(|e| match e {
            SecretStoreError::NotFound => InterceptorError::NotFound(NotFoundError::Secret {
                namespace: namespace.to_string(),
                name: secret_ref.name.clone(),
            }),
            SecretStoreError::Unavailable { message } => InterceptorError::StoreUnavailable {
                resource: format!("secret {}/{}", namespace, secret_ref.name),
                message,
            },
        })?;

    let value = data
        .get(&secret_ref.key)
        .cloned()
        .ok_or_else(|| NotFoundError::SecretKey {
            namespace: namespace.to_string(),
            name: secret_ref.name.clone(),
            key: secret_ref.key.clone(),
        })?;

    debug!(cache_key = %cache_key, "Secret fetched from store and cached");
    cache.insert(cache_key, value.clone());
    Ok(value)
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
