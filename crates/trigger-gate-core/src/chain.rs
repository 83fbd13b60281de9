//! # Chain Orchestration
//!
//! Runs the steps of an interceptor chain strictly in order:
//!
//! ```text
//! PENDING → RUNNING(0) → RUNNING(1) → … → ACCEPTED
//!              │              │
//!              ├→ REJECTED    ├→ REJECTED     (continue = false)
//!              └→ ERRORED     └→ ERRORED      (hard failure)
//! ```
//!
//! Extensions contributed by a step are visible to every later step. The
//! first rejection or error ends the run; no later step executes.

use crate::{
    endpoint::{resolve_to_url, EndpointStore},
    executor::InterceptorClient,
    headers::{canonical, canonical_from_pairs, canonical_key, Headers},
    interceptors::SignatureInterceptor,
    params::{EventInterceptor, InterceptorConfig, InterceptorKind},
    secrets::{RequestCache, SecretStore},
    signature::ProviderPolicy,
    wire::{InterceptorRequest, InterceptorResponse, Status, StatusCode, TriggerContext},
    InterceptorError, MarshalError, NotFoundError,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Inputs
// ============================================================================

/// An event as received from the sender, before any step has run
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Raw body bytes; verified and forwarded unchanged
    pub body: Bytes,

    /// Headers in canonical form
    pub headers: Headers,

    /// Correlation metadata; its trigger ID also fixes the event's namespace
    pub context: TriggerContext,
}

impl InboundEvent {
    /// Wrap a received event. Header keys are canonicalized.
    pub fn new(body: impl Into<Bytes>, headers: &Headers) -> Self {
        Self {
            body: body.into(),
            headers: canonical(headers),
            context: TriggerContext::default(),
        }
    }

    /// Wrap a received event whose headers are `(name, value)` pairs in
    /// arrival order. Case variants of a name are merged in that order.
    pub fn from_pairs<I, K, V>(body: impl Into<Bytes>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            body: body.into(),
            headers: canonical_from_pairs(headers),
            context: TriggerContext::default(),
        }
    }

    /// Namespace secrets and webhook services default to.
    ///
    /// Derived from the trigger ID in `context`, else `default`; interceptors
    /// served over HTTP derive it from the same field.
    pub fn namespace(&self) -> &str {
        self.context.namespace_or_default()
    }

    pub fn with_context(mut self, context: TriggerContext) -> Self {
        self.context = context;
        self
    }
}

/// Chain execution settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    /// Upper bound on one step's network call. Expiry is a transport error
    /// and is not retried.
    pub step_timeout: Option<Duration>,
}

impl ChainConfig {
    pub fn with_step_timeout(timeout: Duration) -> Self {
        Self {
            step_timeout: Some(timeout),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Position of a run in the chain state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Pending,
    Running(usize),
    Rejected,
    Errored,
    Accepted,
}

impl ChainState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Errored | Self::Accepted)
    }
}

/// How a completed run ended, short of a hard failure
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// Every step let the event through
    Accepted {
        extensions: Map<String, Value>,
        steps: usize,
    },

    /// A step returned `continue = false`
    Rejected {
        step: usize,
        name: String,
        status: Status,
        extensions: Map<String, Value>,
    },
}

impl ChainOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn state(&self) -> ChainState {
        match self {
            Self::Accepted { .. } => ChainState::Accepted,
            Self::Rejected { .. } => ChainState::Rejected,
        }
    }

    /// Extensions accumulated up to and including the final step
    pub fn extensions(&self) -> &Map<String, Value> {
        match self {
            Self::Accepted { extensions, .. } | Self::Rejected { extensions, .. } => extensions,
        }
    }

    /// HTTP status to answer the event sender with.
    ///
    /// A rejection that carries no code is reported as a failed
    /// precondition.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Accepted { .. } => 202,
            Self::Rejected { status, .. } if status.code == StatusCode::Ok => {
                StatusCode::FailedPrecondition.http_status()
            }
            Self::Rejected { status, .. } => status.code.http_status(),
        }
    }
}

/// A step failed hard; the run ended in [`ChainState::Errored`]
#[derive(Debug, thiserror::Error)]
#[error("interceptor step {step} ({name}) failed: {source}")]
pub struct ChainError {
    pub step: usize,
    pub name: String,
    #[source]
    pub source: InterceptorError,
}

impl ChainError {
    pub fn state(&self) -> ChainState {
        ChainState::Errored
    }

    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }

    pub fn http_status(&self) -> u16 {
        self.source.http_status()
    }
}

// ============================================================================
// InterceptorChain
// ============================================================================

/// An ordered list of steps plus everything needed to execute them
pub struct InterceptorChain {
    steps: Vec<EventInterceptor>,
    client: Arc<dyn InterceptorClient>,
    endpoints: Arc<dyn EndpointStore>,
    secrets: Arc<dyn SecretStore>,
    config: ChainConfig,
}

impl InterceptorChain {
    pub fn new(
        steps: Vec<EventInterceptor>,
        client: Arc<dyn InterceptorClient>,
        endpoints: Arc<dyn EndpointStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            steps,
            client,
            endpoints,
            secrets,
            config: ChainConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn steps(&self) -> &[EventInterceptor] {
        &self.steps
    }

    /// Run every step against `event`.
    ///
    /// `cache` must be created for this event alone; secrets referenced by
    /// several steps are fetched from the store once.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] naming the first step that failed hard.
    #[instrument(
        skip(self, event, cache),
        fields(event_id = %event.context.event_id, steps = self.steps.len())
    )]
    pub async fn run(
        &self,
        event: &InboundEvent,
        cache: &RequestCache,
    ) -> Result<ChainOutcome, ChainError> {
        let mut extensions = Map::new();

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.display_name();
            debug!(state = ?ChainState::Running(index), step_name = name, "Running interceptor step");

            let response = self
                .run_step(step, event, &extensions, cache)
                .await
                .map_err(|source| {
                    warn!(
                        step = index,
                        step_name = name,
                        error = %source,
                        transient = source.is_transient(),
                        "Interceptor step failed"
                    );
                    ChainError {
                        step: index,
                        name: name.to_string(),
                        source,
                    }
                })?;

            extensions.extend(response.extensions);

            if !response.continue_flow {
                info!(step = index, step_name = name, status = %response.status, "Event rejected");
                return Ok(ChainOutcome::Rejected {
                    step: index,
                    name: name.to_string(),
                    status: response.status,
                    extensions,
                });
            }
        }

        debug!(state = ?ChainState::Accepted, "Event accepted");
        Ok(ChainOutcome::Accepted {
            extensions,
            steps: self.steps.len(),
        })
    }

    async fn run_step(
        &self,
        step: &EventInterceptor,
        event: &InboundEvent,
        extensions: &Map<String, Value>,
        cache: &RequestCache,
    ) -> Result<InterceptorResponse, InterceptorError> {
        let config = step.config()?;

        if let Some(r) = step.interceptor_ref.as_ref() {
            if r.kind == InterceptorKind::Builtin {
                return self.run_builtin(&r.name, config, event, cache);
            }
        }

        let url = self.step_url(step, event)?;
        let request = build_request(step, event, extensions)?;
        self.call(&request, url.as_str()).await
    }

    fn run_builtin(
        &self,
        name: &str,
        config: InterceptorConfig,
        event: &InboundEvent,
        cache: &RequestCache,
    ) -> Result<InterceptorResponse, InterceptorError> {
        let not_found = || NotFoundError::Provider {
            name: name.to_string(),
        };
        let policy = ProviderPolicy::preset(name).ok_or_else(not_found)?;
        let InterceptorConfig::Signature(params) = config else {
            return Err(not_found().into());
        };

        SignatureInterceptor::new(policy, Arc::clone(&self.secrets)).verify(
            &event.body,
            &event.headers,
            &params,
            cache,
            event.namespace(),
        )?;
        Ok(InterceptorResponse::proceed())
    }

    fn step_url(
        &self,
        step: &EventInterceptor,
        event: &InboundEvent,
    ) -> Result<url::Url, InterceptorError> {
        let no_url = || InterceptorError::NoUrl {
            name: step.display_name().to_string(),
        };

        if let Some(webhook) = &step.webhook {
            return webhook
                .object_ref
                .as_ref()
                .and_then(|object_ref| object_ref.service_url(event.namespace()))
                .ok_or_else(no_url);
        }

        match &step.interceptor_ref {
            Some(r) => resolve_to_url(self.endpoints.as_ref(), &r.name),
            None => Err(no_url()),
        }
    }

    async fn call(
        &self,
        request: &InterceptorRequest,
        url: &str,
    ) -> Result<InterceptorResponse, InterceptorError> {
        let call = self.client.execute(request, url);
        match self.config.step_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|elapsed| InterceptorError::transport(url, elapsed))?,
            None => call.await,
        }
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("steps", &self.steps)
            .field("config", &self.config)
            .finish()
    }
}

/// Fresh wire request for one step
fn build_request(
    step: &EventInterceptor,
    event: &InboundEvent,
    extensions: &Map<String, Value>,
) -> Result<InterceptorRequest, MarshalError> {
    let mut header = event.headers.clone();
    if let Some(webhook) = &step.webhook {
        for param in &webhook.header {
            header
                .entry(canonical_key(&param.name))
                .or_default()
                .extend(param.value.values());
        }
    }

    Ok(InterceptorRequest {
        body: String::from_utf8_lossy(&event.body).into_owned(),
        header,
        extensions: extensions.clone(),
        interceptor_params: step.interceptor_params()?,
        context: Some(event.context.clone()),
    })
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
