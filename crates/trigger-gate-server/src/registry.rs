//! Interceptor registry for the `POST /{provider}` route.
//!
//! Maps the path segment to the [`Interceptor`] that handles it.

use std::{collections::HashMap, sync::Arc};
use trigger_gate_core::{
    interceptors::{Interceptor, SignatureInterceptor},
    ProviderPolicy, SecretStore,
};

/// Registry of interceptors served over HTTP, keyed by [`Interceptor::name`].
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use trigger_gate_core::adapters::InMemorySecretStore;
/// use trigger_gate_server::InterceptorRegistry;
///
/// let registry = InterceptorRegistry::from_presets(
///     &["github".to_string()],
///     Arc::new(InMemorySecretStore::new()),
/// );
/// assert!(registry.contains("github"));
/// assert!(!registry.contains("gitlab"));
/// ```
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    interceptors: HashMap<String, Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the signature interceptor for every named preset.
    ///
    /// Names without a preset are skipped; configuration validation rejects
    /// them before this point.
    pub fn from_presets(names: &[String], secrets: Arc<dyn SecretStore>) -> Self {
        let mut registry = Self::new();
        for policy in names.iter().filter_map(|name| ProviderPolicy::preset(name)) {
            registry.register(Arc::new(SignatureInterceptor::new(
                policy,
                Arc::clone(&secrets),
            )));
        }
        registry
    }

    /// Register an interceptor under its own name.
    ///
    /// An interceptor with the same name is replaced.
    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors
            .insert(interceptor.name().to_string(), interceptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Interceptor>> {
        self.interceptors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.interceptors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.interceptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
