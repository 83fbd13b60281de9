//! # Endpoint Resolution
//!
//! Maps an interceptor name to the absolute URL its service answers on.
//!
//! An [`InterceptorEndpoint`] may advertise up to three locations. They are
//! tried in order:
//!
//! 1. `status.address.url`, populated once the backing service is live
//! 2. `spec.clientConfig.url`, static configuration
//! 3. `spec.clientConfig.service`, rendered as an in-cluster service URL
//!
//! An endpoint with none of them fails with [`InterceptorError::NoUrl`].

use crate::{InterceptorError, NotFoundError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

// ============================================================================
// Endpoint resource
// ============================================================================

/// Where a named interceptor service can be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InterceptorEndpoint {
    pub name: String,

    #[serde(default)]
    pub spec: EndpointSpec,

    #[serde(default)]
    pub status: EndpointStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EndpointSpec {
    #[serde(rename = "clientConfig", default)]
    pub client_config: ClientConfig,
}

/// Static connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceReference>,
}

/// In-cluster service backing an interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    pub name: String,
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServiceReference {
    const DEFAULT_PORT: u16 = 80;

    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            path: None,
            port: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// `http://<name>.<namespace>.svc:<port><path>`
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let port = self.port.unwrap_or(Self::DEFAULT_PORT);
        let path = self.path.as_deref().unwrap_or("");
        let separator = if path.is_empty() || path.starts_with('/') {
            ""
        } else {
            "/"
        };
        Url::parse(&format!(
            "http://{}.{}.svc:{}{}{}",
            self.name, self.namespace, port, separator, path
        ))
    }
}

/// Observed state of the backing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EndpointStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Addressable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Addressable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}

impl InterceptorEndpoint {
    /// Endpoint with no locations; not yet resolvable
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Record the live address of the backing service
    pub fn with_address_url(mut self, url: Url) -> Self {
        self.status.address = Some(Addressable { url: Some(url) });
        self
    }

    pub fn with_spec_url(mut self, url: Url) -> Self {
        self.spec.client_config.url = Some(url);
        self
    }

    pub fn with_service(mut self, service: ServiceReference) -> Self {
        self.spec.client_config.service = Some(service);
        self
    }

    /// Live address, if the backing service has reported ready
    pub fn address_url(&self) -> Option<&Url> {
        self.status.address.as_ref()?.url.as_ref()
    }

    /// Best available URL, following the documented preference order
    pub fn resolve_url(&self) -> Option<Url> {
        if let Some(url) = self.address_url() {
            return Some(url.clone());
        }
        if let Some(url) = &self.spec.client_config.url {
            return Some(url.clone());
        }
        self.spec
            .client_config
            .service
            .as_ref()
            .and_then(|service| service.url().ok())
    }
}

// ============================================================================
// Store interface
// ============================================================================

/// Failure reported by an [`EndpointStore`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EndpointStoreError {
    #[error("interceptor not found")]
    NotFound,

    #[error("endpoint store unavailable: {message}")]
    Unavailable { message: String },
}

/// Read-only lookup of interceptor endpoints by name
pub trait EndpointStore: Send + Sync {
    fn get_by_name(&self, name: &str) -> Result<InterceptorEndpoint, EndpointStoreError>;
}

impl<F> EndpointStore for F
where
    F: Fn(&str) -> Result<InterceptorEndpoint, EndpointStoreError> + Send + Sync,
{
    fn get_by_name(&self, name: &str) -> Result<InterceptorEndpoint, EndpointStoreError> {
        self(name)
    }
}

/// Resolve the interceptor `name` to an absolute URL.
///
/// # Errors
///
/// - [`NotFoundError::Endpoint`] when no such interceptor exists
/// - [`InterceptorError::StoreUnavailable`] when the store cannot answer
/// - [`InterceptorError::NoUrl`] when the endpoint advertises no location
#[instrument(skip(store))]
pub fn resolve_to_url<S>(store: &S, name: &str) -> Result<Url, InterceptorError>
where
    S: EndpointStore + ?Sized,
{
    let endpoint = store.get_by_name(name).map_err(|e| match e {
        EndpointStoreError::NotFound => InterceptorError::NotFound(NotFoundError::Endpoint {
            name: name.to_string(),
        }),
        EndpointStoreError::Unavailable { message } => InterceptorError::StoreUnavailable {
            resource: format!("interceptor {}", name),
            message,
        },
    })?;

    let url = endpoint.resolve_url().ok_or_else(|| InterceptorError::NoUrl {
        name: name.to_string(),
    })?;

    debug!(url = %url, "Resolved interceptor URL");
    Ok(url)
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
