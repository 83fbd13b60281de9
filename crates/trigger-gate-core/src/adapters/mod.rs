//! # In-Memory Adapters
//!
//! HashMap-backed implementations of the store interfaces, for development
//! deployments and tests. Both count lookups so callers can assert how often
//! the backing store was hit.

use crate::{
    endpoint::{EndpointStore, EndpointStoreError, InterceptorEndpoint},
    secrets::{SecretBytes, SecretData, SecretStore, SecretStoreError},
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        PoisonError, RwLock,
    },
};

// ============================================================================
// Secrets
// ============================================================================

/// Secret store backed by a map of `(namespace, name)` to secret fields
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<(String, String), SecretData>>,
    lookups: AtomicUsize,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one field of a secret
    pub fn insert(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<SecretBytes>,
    ) {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((namespace.into(), name.into()))
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder form of [`InMemorySecretStore::insert`]
    pub fn with_secret(
        self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<SecretBytes>,
    ) -> Self {
        self.insert(namespace, name, key, value);
        self
    }

    pub fn remove(&self, namespace: &str, name: &str) {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Number of `get_secret` calls served so far, hits and misses alike
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SecretStore for InMemorySecretStore {
    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(SecretStoreError::NotFound)
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Endpoint store backed by a map of interceptor name to endpoint
#[derive(Debug, Default)]
pub struct InMemoryEndpointStore {
    endpoints: RwLock<HashMap<String, InterceptorEndpoint>>,
    lookups: AtomicUsize,
}

impl InMemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an endpoint, keyed by its name
    pub fn insert(&self, endpoint: InterceptorEndpoint) {
        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint.name.clone(), endpoint);
    }

    pub fn with_endpoint(self, endpoint: InterceptorEndpoint) -> Self {
        self.insert(endpoint);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl EndpointStore for InMemoryEndpointStore {
    fn get_by_name(&self, name: &str) -> Result<InterceptorEndpoint, EndpointStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or(EndpointStoreError::NotFound)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
