//! # Trigger Gate Server
//!
//! HTTP service that hosts the built-in interceptors over the interceptor
//! wire protocol, so chain steps that reference them by name can reach them
//! through the HTTP executor.
//!
//! Routes:
//! - `POST /{provider}`: one [`InterceptorRequest`] in, one
//!   [`InterceptorResponse`] out
//! - `GET /ready`: readiness check

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::{
    future::{Future, IntoFuture},
    sync::Arc,
    time::Duration,
};
use tokio::{net::TcpListener, sync::Notify};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn};
use trigger_gate_core::{InterceptorRequest, InterceptorResponse, RequestCache, SecretStore};

pub mod config;
pub mod errors;
pub mod registry;

pub use config::{HttpConfig, InterceptorsConfig, LiteralSecret, LoggingConfig, ServerConfig};
pub use errors::{ConfigError, HandlerError, ServiceError};
pub use registry::InterceptorRegistry;

// ============================================================================
// Application state
// ============================================================================

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub registry: Arc<InterceptorRegistry>,
}

impl AppState {
    pub fn new(config: ServerConfig, registry: InterceptorRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// State serving the enabled presets, backed by `secrets`
    pub fn from_config(config: ServerConfig, secrets: Arc<dyn SecretStore>) -> Self {
        let registry = InterceptorRegistry::from_presets(&config.interceptors.enabled, secrets);
        Self::new(config, registry)
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .route("/ready", get(handle_readiness_check))
        .route("/{provider}", post(handle_interceptor))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

async fn handle_readiness_check() -> &'static str {
    "ok"
}

/// Run one interceptor request.
///
/// A fresh [`RequestCache`] is created for every inbound request.
#[instrument(skip(state, body), fields(provider = %provider, body_size = body.len()))]
async fn handle_interceptor(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<InterceptorResponse>, HandlerError> {
    let interceptor = state
        .registry
        .get(&provider)
        .ok_or_else(|| HandlerError::ProviderNotFound {
            provider: provider.clone(),
        })?;

    let request: InterceptorRequest = serde_json::from_slice(&body)?;

    let cache = RequestCache::new();
    let response = interceptor.process(&request, &cache).await;

    debug!(
        continue_flow = response.continue_flow,
        code = response.status.code.as_str(),
        secrets_resolved = cache.len(),
        "Interceptor responded"
    );

    Ok(Json(response))
}

// ============================================================================
// Server lifecycle
// ============================================================================

/// Bind to the configured address and serve until SIGINT or SIGTERM.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let address = state.config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, interceptors = ?state.registry.names(), "Starting HTTP server");

    serve(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes.
///
/// In-flight requests are given `server.shutdown_timeout_seconds` to finish
/// once `shutdown` resolves; after that the server returns regardless.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown_timeout = Duration::from_secs(state.config.server.shutdown_timeout_seconds);
    let app = create_router(state);

    let draining = Arc::new(Notify::new());
    let notify = Arc::clone(&draining);
    let signal = async move {
        shutdown.await;
        info!(
            timeout_seconds = shutdown_timeout.as_secs(),
            "Shutdown requested; draining in-flight requests"
        );
        notify.notify_one();
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .into_future();

    tokio::select! {
        result = server => result.map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        }),
        _ = async {
            draining.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; abandoning in-flight requests"
            );
            Ok(())
        }
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
