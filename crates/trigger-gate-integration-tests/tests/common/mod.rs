//! Common test utilities for trigger-gate integration tests
//!
//! This module provides:
//! - A real interceptor server on an ephemeral port
//! - Endpoint and secret fixtures pointing at it
//! - Signed GitHub-style events

use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use trigger_gate_core::{
    adapters::{InMemoryEndpointStore, InMemorySecretStore},
    EventInterceptor, Headers, HttpInterceptorClient, InboundEvent, InterceptorChain,
    InterceptorEndpoint, TriggerContext,
};
use trigger_gate_server::{serve, AppState, ServerConfig, ServiceError};
use url::Url;

/// Namespace the test trigger lives in
pub const NAMESPACE: &str = "ci";

/// Payload signed by [`SHA1_SIGNATURE`] with the secret `secret`
pub const PAYLOAD: &str = "somepayload";

pub const SHA1_SIGNATURE: &str = "sha1=38e005ef7dd3faee13204505532011257023654e";

// ============================================================================
// Test server
// ============================================================================

/// Interceptor server running on `127.0.0.1` until dropped or stopped
pub struct TestServer {
    pub base_url: Url,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServiceError>>>,
}

impl TestServer {
    /// Start a server with every preset enabled, backed by `secrets`
    pub async fn start(secrets: Arc<InMemorySecretStore>) -> Self {
        Self::start_with(ServerConfig::default(), secrets).await
    }

    pub async fn start_with(config: ServerConfig, secrets: Arc<InMemorySecretStore>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let state = AppState::from_config(config, secrets);
        let handle = tokio::spawn(serve(listener, state, async {
            let _ = rx.await;
        }));

        Self {
            base_url: Url::parse(&format!("http://{}/", address)).unwrap(),
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// URL of the interceptor registered under `name`
    pub fn interceptor_url(&self, name: &str) -> Url {
        self.base_url.join(name).unwrap()
    }

    /// Stop accepting connections and wait for the server task to finish
    #[allow(dead_code)]
    pub async fn stop(mut self) -> Result<(), ServiceError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.unwrap(),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Secret store holding `ci/github-webhook` with `token = secret`
pub fn github_secrets() -> Arc<InMemorySecretStore> {
    Arc::new(InMemorySecretStore::new().with_secret(
        NAMESPACE,
        "github-webhook",
        "token",
        "secret",
    ))
}

/// Endpoint store mapping each name to `{server}/{name}`
#[allow(dead_code)]
pub fn endpoints_for(server: &TestServer, names: &[&str]) -> InMemoryEndpointStore {
    let store = InMemoryEndpointStore::new();
    for name in names {
        store.insert(InterceptorEndpoint::new(*name).with_spec_url(server.interceptor_url(name)));
    }
    store
}

/// A GitHub ref step checking the shared secret and an event allow-list
#[allow(dead_code)]
pub fn github_step(event_types: &[&str]) -> EventInterceptor {
    EventInterceptor::cluster("github")
        .with_param(
            "secretRef",
            serde_json::json!({"secretName": "github-webhook", "secretKey": "token"}),
        )
        .with_param("eventTypes", serde_json::json!(event_types))
}

/// An event carrying `signature` and `event_type`, received by a trigger in [`NAMESPACE`]
#[allow(dead_code)]
pub fn github_event(signature: &str, event_type: &str) -> InboundEvent {
    let headers = Headers::from([
        ("x-hub-signature".to_string(), vec![signature.to_string()]),
        ("x-github-event".to_string(), vec![event_type.to_string()]),
    ]);

    InboundEvent::new(PAYLOAD, &headers)
        .with_context(TriggerContext::new(
            "http://listener.ci.svc",
            format!("namespaces/{}/triggers/on-push", NAMESPACE),
        ))
}

/// A chain using the real HTTP executor
#[allow(dead_code)]
pub fn http_chain(
    steps: Vec<EventInterceptor>,
    endpoints: InMemoryEndpointStore,
    secrets: Arc<InMemorySecretStore>,
) -> InterceptorChain {
    InterceptorChain::new(
        steps,
        Arc::new(HttpInterceptorClient::default()),
        Arc::new(endpoints),
        secrets,
    )
}
