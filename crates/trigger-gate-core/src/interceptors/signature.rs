use super::Interceptor;
use crate::{
    headers::Headers,
    params::{unmarshal_params, SignatureParams},
    secrets::{resolve_secret, RequestCache, SecretStore},
    signature::{ProviderPolicy, SignatureVerifier},
    wire::{InterceptorRequest, InterceptorResponse, StatusCode, TriggerContext},
    InterceptorError,
};
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument, warn};

/// Namespace used when neither the secret reference nor the trigger names one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Signature and event-type check for one source-control provider.
#[derive(Clone)]
pub struct SignatureInterceptor {
    verifier: SignatureVerifier,
    secrets: Arc<dyn SecretStore>,
}

impl SignatureInterceptor {
    pub fn new(policy: ProviderPolicy, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            verifier: SignatureVerifier::new(policy),
            secrets,
        }
    }

    /// One interceptor per provider preset, all sharing `secrets`
    pub fn presets(secrets: Arc<dyn SecretStore>) -> Vec<Self> {
        ProviderPolicy::PRESET_NAMES
            .iter()
            .filter_map(|name| ProviderPolicy::preset(name))
            .map(|policy| Self::new(policy, Arc::clone(&secrets)))
            .collect()
    }

    pub fn policy(&self) -> &ProviderPolicy {
        self.verifier.policy()
    }

    /// Verify raw event bytes.
    ///
    /// The secret, if configured, is resolved through `cache`; its namespace
    /// defaults to `namespace`.
    ///
    /// # Errors
    ///
    /// - [`InterceptorError::Validation`] when the signature or event type is
    ///   rejected
    /// - [`InterceptorError::NotFound`] / [`InterceptorError::StoreUnavailable`]
    ///   when the secret cannot be resolved
    #[instrument(skip(self, body, headers, params, cache), fields(provider = %self.policy().name))]
    pub fn verify(
        &self,
        body: &[u8],
        headers: &Headers,
        params: &SignatureParams,
        cache: &RequestCache,
        namespace: &str,
    ) -> Result<(), InterceptorError> {
        let secret = params
            .secret_ref
            .as_ref()
            .map(|secret_ref| resolve_secret(cache, self.secrets.as_ref(), secret_ref, namespace))
            .transpose()?;

        if secret.is_none() {
            debug!("No secret configured; skipping signature check");
        }

        self.verifier
            .verify(body, headers, secret.as_ref(), params.event_types.as_deref())?;
        Ok(())
    }
}

#[async_trait]
impl Interceptor for SignatureInterceptor {
    fn name(&self) -> &str {
        &self.policy().name
    }

    async fn process(
        &self,
        request: &InterceptorRequest,
        cache: &RequestCache,
    ) -> InterceptorResponse {
        let params: SignatureParams = match unmarshal_params(&request.interceptor_params) {
            Ok(params) => params,
            Err(e) => {
                warn!(provider = %self.name(), error = %e, "Invalid interceptor parameters");
                return InterceptorResponse::fail(StatusCode::InvalidArgument, e.to_string());
            }
        };

        let namespace = request
            .context
            .as_ref()
            .map_or(DEFAULT_NAMESPACE, TriggerContext::namespace_or_default);

        match self.verify(request.body_bytes(), &request.header, &params, cache, namespace) {
            Ok(()) => InterceptorResponse::proceed(),
            Err(InterceptorError::Validation(e)) => {
                info!(provider = %self.name(), reason = %e, "Event rejected");
                InterceptorResponse::fail(StatusCode::FailedPrecondition, e.to_string())
            }
            Err(e) => {
                warn!(
                    provider = %self.name(),
                    error = %e,
                    category = ?e.error_category(),
                    "Signature check could not run"
                );
                InterceptorResponse::fail(StatusCode::Internal, e.to_string())
            }
        }
    }
}

impl fmt::Debug for SignatureInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureInterceptor")
            .field("policy", self.policy())
            .field("secrets", &"<SecretStore>")
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
