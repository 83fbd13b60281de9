//! # Trigger Gate Core
//!
//! Interceptor execution pipeline for inbound webhook events.
//!
//! Every event that arrives at a trigger listener is run through an ordered
//! chain of interceptor steps before it may instantiate pipeline resources.
//! Each step can reject, transform, or annotate the event. This crate holds
//! the pieces that make up that pipeline:
//!
//! - [`headers`]: header canonicalization for stable, case-insensitive lookups
//! - [`secrets`]: request-scoped secret resolution with de-duplicating cache
//! - [`signature`]: provider-parameterized HMAC and event-type verification
//! - [`params`]: conversion of generic parameter bags into typed configuration
//! - [`endpoint`]: resolution of interceptor names to callable URLs
//! - [`executor`]: one HTTP round trip to an interceptor service
//! - [`chain`]: sequential orchestration of a whole interceptor chain
//!
//! ## Architecture
//!
//! Business logic depends only on trait abstractions:
//! - [`secrets::SecretStore`] and [`endpoint::EndpointStore`] are synchronous
//!   read-only lookups supplied by the caller
//! - [`executor::InterceptorClient`] performs the network call and can be
//!   replaced in tests
//!
//! ## Usage
//!
//! ```rust
//! use trigger_gate_core::headers::canonical_key;
//! use trigger_gate_core::signature::ProviderPolicy;
//!
//! assert_eq!(canonical_key("x-hub-signature"), "X-Hub-Signature");
//! assert_eq!(ProviderPolicy::github().signature_header, "X-Hub-Signature");
//! ```

use serde::{Deserialize, Serialize};

/// Standard result type for interceptor pipeline operations
pub type InterceptorResult<T> = Result<T, InterceptorError>;

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for alerting and response rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures; the event sender may redeliver
    Transient,
    /// Permanent failures that won't succeed on redelivery
    Permanent,
    /// Authenticity failures (bad signature, unexpected event type)
    Security,
    /// Missing or incomplete resources and parameters
    Configuration,
}

/// Event authenticity or relevance check failed.
///
/// The event should be rejected, not crashed on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no {header} header set")]
    MissingSignature { header: String },

    #[error("invalid {header} header: {message}")]
    InvalidSignatureFormat { header: String, message: String },

    #[error("{header} does not match the payload")]
    SignatureMismatch { header: String },

    #[error("no {header} header set")]
    MissingEventType { header: String },

    #[error("event type {event_type} is not allowed")]
    EventTypeNotAllowed {
        event_type: String,
        allowed: Vec<String>,
    },

    #[error("secret cannot be used as a signing key: {message}")]
    InvalidSecret { message: String },
}

/// A referenced resource does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("secret {namespace}/{name} not found")]
    Secret { namespace: String, name: String },

    #[error("key {key} not found in secret {namespace}/{name}")]
    SecretKey {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("interceptor {name} not found")]
    Endpoint { name: String },

    #[error("no built-in interceptor named {name}")]
    Provider { name: String },
}

/// Parameter encode/decode failure.
///
/// The encode message always contains `failed to marshal json` so callers
/// and operators can match on it.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("failed to marshal json: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to unmarshal json: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Top-level error for the interceptor pipeline
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error("lookup of {resource} failed: {message}")]
    StoreUnavailable { resource: String, message: String },

    #[error("interceptor {name} has no URL; the interceptor service is not ready")]
    NoUrl { name: String },

    #[error("failed to reach interceptor at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("interceptor at {url} responded with HTTP status {status}")]
    Upstream { url: String, status: u16 },

    #[error("failed to decode response from interceptor at {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InterceptorError {
    /// Wrap any transport-level failure.
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Check if error is transient; a redelivery of the same event may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            Self::StoreUnavailable { .. } => true,
            Self::NoUrl { .. } => true,
            Self::Validation(_) => false,
            Self::NotFound(_) => false,
            Self::Marshal(_) => false,
            Self::Decode { .. } => false,
        }
    }

    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Security,
            Self::NotFound(_) => ErrorCategory::Configuration,
            Self::Marshal(_) => ErrorCategory::Configuration,
            Self::NoUrl { .. } => ErrorCategory::Transient,
            Self::StoreUnavailable { .. } => ErrorCategory::Transient,
            Self::Transport { .. } => ErrorCategory::Transient,
            Self::Upstream { .. } => {
                if self.is_transient() {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
            Self::Decode { .. } => ErrorCategory::Permanent,
        }
    }

    /// HTTP status to report to the original event sender.
    ///
    /// Distinct from the codes used for rejected events so that "the system
    /// failed" is never confused with "your event was filtered".
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) | Self::Marshal(_) => 500,
            Self::NoUrl { .. } | Self::StoreUnavailable { .. } => 503,
            Self::Transport { .. } | Self::Upstream { .. } | Self::Decode { .. } => 502,
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Wire types shared with interceptor services
pub mod wire;

/// Header canonicalization
pub mod headers;

/// Secret references, store interface and per-request cache
pub mod secrets;

/// Provider-parameterized signature verification
pub mod signature;

/// Interceptor parameter marshaling
pub mod params;

/// Interceptor endpoint resolution
pub mod endpoint;

/// HTTP executor for a single interceptor step
pub mod executor;

/// Built-in interceptors that run without a network hop
pub mod interceptors;

/// Chain orchestration
pub mod chain;

/// In-memory implementations of the collaborator interfaces
pub mod adapters;

pub use chain::{ChainConfig, ChainError, ChainOutcome, ChainState, InboundEvent, InterceptorChain};
pub use endpoint::{resolve_to_url, EndpointStore, InterceptorEndpoint};
pub use executor::{execute, HttpInterceptorClient, InterceptorClient};
pub use headers::{canonical, canonical_key, Headers};
pub use params::{EventInterceptor, InterceptorKind, InterceptorParam, InterceptorRef};
pub use secrets::{RequestCache, SecretBytes, SecretRef, SecretStore};
pub use signature::{DigestAlgorithm, ProviderPolicy, SignatureVerifier};
pub use wire::{InterceptorRequest, InterceptorResponse, Status, StatusCode, TriggerContext};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
