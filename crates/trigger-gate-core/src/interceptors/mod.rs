//! # Built-in Interceptors
//!
//! Interceptors compiled into this process. The server exposes each one over
//! the wire protocol under its [`Interceptor::name`]; the chain can also run
//! them in-process for `Builtin` steps.

use crate::{
    secrets::RequestCache,
    wire::{InterceptorRequest, InterceptorResponse},
};
use async_trait::async_trait;

mod signature;

pub use signature::{SignatureInterceptor, DEFAULT_NAMESPACE};

/// A chain step implemented locally.
///
/// `process` always produces a response: failures are reported as
/// `continue = false` with an explanatory status rather than as errors, the
/// same way a remote interceptor service would report them.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name the interceptor is addressed by, e.g. `github`
    fn name(&self) -> &str;

    /// Evaluate one request. `cache` is scoped to the inbound request.
    async fn process(&self, request: &InterceptorRequest, cache: &RequestCache)
        -> InterceptorResponse;
}
