//! # Interceptor Executor
//!
//! One HTTP round trip to an interceptor service: serialize the request,
//! `POST` it, check the status, parse the response.
//!
//! The executor never interprets `continue` and never retries. The caller's
//! timeout budget governs how long it waits.

use crate::{
    wire::{InterceptorRequest, InterceptorResponse},
    InterceptorError,
};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Performs a single interceptor call.
///
/// The chain depends on this trait rather than on [`reqwest`] directly so
/// tests can substitute a scripted client.
#[async_trait]
pub trait InterceptorClient: Send + Sync {
    async fn execute(
        &self,
        request: &InterceptorRequest,
        url: &str,
    ) -> Result<InterceptorResponse, InterceptorError>;
}

/// [`InterceptorClient`] backed by a caller-supplied [`reqwest::Client`]
#[derive(Debug, Clone, Default)]
pub struct HttpInterceptorClient {
    client: reqwest::Client,
}

impl HttpInterceptorClient {
    /// Wrap an existing client, keeping its TLS and proxy settings
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client whose every call is bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl InterceptorClient for HttpInterceptorClient {
    async fn execute(
        &self,
        request: &InterceptorRequest,
        url: &str,
    ) -> Result<InterceptorResponse, InterceptorError> {
        execute(&self.client, request, url).await
    }
}

/// Send `request` to the interceptor at `url` and parse its answer.
///
/// # Errors
///
/// - [`InterceptorError::Transport`] for a malformed URL, a request that
///   cannot be encoded, an unreachable host, a timeout, or a body that
///   cannot be read
/// - [`InterceptorError::Upstream`] for any status other than 200
/// - [`InterceptorError::Decode`] when the body is not an
///   [`InterceptorResponse`]
#[instrument(skip(client, request), fields(url = %url))]
pub async fn execute(
    client: &reqwest::Client,
    request: &InterceptorRequest,
    url: &str,
) -> Result<InterceptorResponse, InterceptorError> {
    let target = Url::parse(url).map_err(|e| InterceptorError::transport(url, e))?;

    debug!("Calling interceptor");

    // `json` also sets the content type
    let response = client
        .post(target)
        .header(ACCEPT, JSON_CONTENT_TYPE)
        .json(request)
        .send()
        .await
        .map_err(|e| InterceptorError::transport(url, e))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        warn!(status = status.as_u16(), "Interceptor returned non-OK status");
        return Err(InterceptorError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| InterceptorError::transport(url, e))?;

    let parsed: InterceptorResponse =
        serde_json::from_slice(&body).map_err(|source| InterceptorError::Decode {
            url: url.to_string(),
            source,
        })?;

    debug!(continue_flow = parsed.continue_flow, "Interceptor responded");
    Ok(parsed)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
