//! # Interceptor Parameters
//!
//! A chain step carries its configuration as a generic bag of named values so
//! that it can be shipped over the wire to any interceptor. Consumers that
//! need a concrete shape transcode the bag with [`unmarshal_params`].
//!
//! Steps that reference an interceptor expose their `params` list as the bag.
//! Inline webhook steps expose their own structured fields instead.

use crate::{secrets::SecretRef, signature::ProviderPolicy, MarshalError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Step definition
// ============================================================================

/// One named parameter of a chain step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptorParam {
    pub name: String,
    pub value: Value,
}

impl InterceptorParam {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Where a referenced interceptor runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterceptorKind {
    /// A separately deployed service reached over HTTP
    #[default]
    ClusterInterceptor,
    /// Compiled into this process; no network hop
    Builtin,
}

/// Reference from a step to a named interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorRef {
    pub name: String,

    #[serde(default)]
    pub kind: InterceptorKind,
}

impl InterceptorRef {
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InterceptorKind::ClusterInterceptor,
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InterceptorKind::Builtin,
        }
    }
}

/// Reference to the service backing an inline webhook step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl ObjectReference {
    /// Reference a `v1/Service`
    pub fn service(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: "Service".to_string(),
            api_version: "v1".to_string(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// In-cluster URL of the referenced service.
    ///
    /// Only `v1/Service` references have one. An empty namespace falls back
    /// to `default_namespace`.
    pub fn service_url(&self, default_namespace: &str) -> Option<url::Url> {
        if self.kind != "Service" || self.api_version != "v1" || self.name.is_empty() {
            return None;
        }
        let namespace = if self.namespace.is_empty() {
            default_namespace
        } else {
            &self.namespace
        };
        url::Url::parse(&format!("http://{}.{}.svc/", self.name, namespace)).ok()
    }
}

/// Extra header forwarded by an inline webhook step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParam {
    pub name: String,
    pub value: HeaderValue,
}

/// Header parameter value, either a single string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value.clone()],
            Self::Multiple(values) => values.clone(),
        }
    }
}

/// Inline webhook step: call an arbitrary service directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WebhookInterceptor {
    #[serde(rename = "objectRef", default, skip_serializing_if = "Option::is_none")]
    pub object_ref: Option<ObjectReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<HeaderParam>,
}

/// One step of an interceptor chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventInterceptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub interceptor_ref: Option<InterceptorRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<InterceptorParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookInterceptor>,
}

impl EventInterceptor {
    /// Step calling the cluster interceptor `name`
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            interceptor_ref: Some(InterceptorRef::cluster(name)),
            ..Self::default()
        }
    }

    /// Step running the built-in interceptor `name` in-process
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            interceptor_ref: Some(InterceptorRef::builtin(name)),
            ..Self::default()
        }
    }

    /// Inline webhook step
    pub fn webhook(webhook: WebhookInterceptor) -> Self {
        Self {
            webhook: Some(webhook),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push(InterceptorParam::new(name, value));
        self
    }

    /// Name used in logs and errors
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        match (&self.interceptor_ref, &self.webhook) {
            (Some(r), _) => r.name.as_str(),
            (None, Some(_)) => "webhook",
            (None, None) => "unnamed",
        }
    }

    /// Parameter bag sent to the interceptor for this step.
    ///
    /// Webhook steps expose `objectRef` and `header`; referencing steps
    /// expose their `params` list keyed by name. A later duplicate name
    /// replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::Encode`] if a webhook field cannot be
    /// encoded as JSON.
    pub fn interceptor_params(&self) -> Result<Map<String, Value>, MarshalError> {
        match &self.webhook {
            Some(webhook) => webhook_params(webhook),
            None => Ok(params_map(&self.params)),
        }
    }

    /// Typed view of this step's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError`] if the parameter bag does not fit the shape
    /// expected by the referenced interceptor.
    pub fn config(&self) -> Result<InterceptorConfig, MarshalError> {
        if let Some(webhook) = &self.webhook {
            return Ok(InterceptorConfig::Webhook(webhook.clone()));
        }

        let params = self.interceptor_params()?;
        let name = self
            .interceptor_ref
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or_default();

        if ProviderPolicy::preset(name).is_some() {
            return Ok(InterceptorConfig::Signature(unmarshal_params(&params)?));
        }
        if name == "cel" {
            return Ok(InterceptorConfig::Cel(unmarshal_params(&params)?));
        }
        Ok(InterceptorConfig::Custom(params))
    }
}

/// Collapse a parameter list into a name-keyed map
pub fn params_map(params: &[InterceptorParam]) -> Map<String, Value> {
    params
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect()
}

fn webhook_params(webhook: &WebhookInterceptor) -> Result<Map<String, Value>, MarshalError> {
    let mut out = Map::new();
    if let Some(object_ref) = &webhook.object_ref {
        let value = serde_json::to_value(object_ref).map_err(MarshalError::Encode)?;
        out.insert("objectRef".to_string(), value);
    }
    if !webhook.header.is_empty() {
        let value = serde_json::to_value(&webhook.header).map_err(MarshalError::Encode)?;
        out.insert("header".to_string(), value);
    }
    Ok(out)
}

// ============================================================================
// Typed configuration
// ============================================================================

/// Parameters of the signature-verifying interceptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SignatureParams {
    #[serde(rename = "secretRef", default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,

    #[serde(rename = "eventTypes", default, skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<String>>,
}

/// Parameters of an expression-filter interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<CelOverlay>,
}

/// Extension key computed from an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelOverlay {
    pub key: String,
    pub expression: String,
}

/// Step configuration decoded into the shape its interceptor expects
#[derive(Debug, Clone, PartialEq)]
pub enum InterceptorConfig {
    Signature(SignatureParams),
    Cel(CelParams),
    Webhook(WebhookInterceptor),
    /// Interceptor this process knows nothing about; passed through as-is
    Custom(Map<String, Value>),
}

/// Transcode a generic parameter bag into a concrete configuration type.
///
/// The bag is first encoded into a generic JSON value, then decoded into
/// `T`. Unknown fields are ignored unless `T` rejects them.
///
/// # Errors
///
/// - [`MarshalError::Encode`] when `params` cannot be represented as JSON;
///   its message contains `failed to marshal json`
/// - [`MarshalError::Decode`] when the value does not fit `T`
pub fn unmarshal_params<T, P>(params: &P) -> Result<T, MarshalError>
where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(params).map_err(MarshalError::Encode)?;
    serde_json::from_value(value).map_err(MarshalError::Decode)
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
