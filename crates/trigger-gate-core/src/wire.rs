//! # Wire Types
//!
//! JSON shapes exchanged between the chain executor and interceptor
//! services. These must stay byte-compatible with independently deployed
//! interceptors, so field names are fixed by the protocol rather than by
//! Rust naming conventions.

use crate::headers::Headers;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// TriggerContext
// ============================================================================

/// Correlation metadata for one inbound event.
///
/// Immutable for the lifetime of a request and passed unchanged to every
/// chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TriggerContext {
    #[serde(rename = "eventURL", default)]
    pub event_url: String,

    #[serde(rename = "eventID", default)]
    pub event_id: String,

    #[serde(rename = "triggerID", default)]
    pub trigger_id: String,
}

impl TriggerContext {
    /// Create a context with a freshly generated event ID
    pub fn new(event_url: impl Into<String>, trigger_id: impl Into<String>) -> Self {
        Self {
            event_url: event_url.into(),
            event_id: uuid::Uuid::new_v4().to_string(),
            trigger_id: trigger_id.into(),
        }
    }

    /// Namespace encoded in a `namespaces/<ns>/triggers/<name>` trigger ID
    pub fn namespace(&self) -> Option<&str> {
        let mut parts = self.trigger_id.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("namespaces"), Some(ns), Some("triggers")) if !ns.is_empty() => Some(ns),
            _ => None,
        }
    }

    /// Namespace a request runs in: the trigger's, else `default`
    pub fn namespace_or_default(&self) -> &str {
        self.namespace()
            .unwrap_or(crate::interceptors::DEFAULT_NAMESPACE)
    }
}

// ============================================================================
// InterceptorRequest
// ============================================================================

/// Request sent to one interceptor step.
///
/// Built fresh for every step; `extensions` carries everything earlier steps
/// contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InterceptorRequest {
    #[serde(default)]
    pub body: String,

    /// Canonicalized on receipt
    #[serde(default, deserialize_with = "crate::headers::deserialize_canonical")]
    pub header: Headers,

    #[serde(default)]
    pub extensions: Map<String, Value>,

    #[serde(rename = "interceptorParams", default)]
    pub interceptor_params: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TriggerContext>,
}

impl InterceptorRequest {
    /// Raw body bytes as sent by the event source
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// First value of a header, looked up canonically
    pub fn header_value(&self, name: &str) -> Option<&str> {
        crate::headers::first_value(&self.header, name)
    }
}

// ============================================================================
// InterceptorResponse
// ============================================================================

/// Result of one interceptor step.
///
/// `continue_flow == false` is a terminal rejection, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InterceptorResponse {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,

    #[serde(rename = "continue", default)]
    pub continue_flow: bool,

    #[serde(default, skip_serializing_if = "Status::is_ok")]
    pub status: Status,
}

impl InterceptorResponse {
    /// Let the chain proceed without contributing extensions
    pub fn proceed() -> Self {
        Self {
            continue_flow: true,
            ..Self::default()
        }
    }

    /// Let the chain proceed, contributing extensions to later steps
    pub fn proceed_with(extensions: Map<String, Value>) -> Self {
        Self {
            extensions,
            continue_flow: true,
            status: Status::default(),
        }
    }

    /// Stop the chain with an explanatory status
    pub fn fail(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            extensions: Map::new(),
            continue_flow: false,
            status: Status {
                code,
                message: message.into(),
            },
        }
    }
}

/// Explanation attached to a rejecting response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Status {
    #[serde(default)]
    pub code: StatusCode,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Status {
    /// True for the zero-value status (OK, no message)
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok && self.message.is_empty()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// ============================================================================
// StatusCode
// ============================================================================

/// gRPC-style status code carried in [`Status`].
///
/// Serialized as its integer value; decoding also accepts the upper-case
/// code name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    #[default]
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl StatusCode {
    const ALL: [StatusCode; 17] = [
        Self::Ok,
        Self::Cancelled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    /// Numeric gRPC value
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Look up a code by its numeric gRPC value
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Upper-case gRPC name, e.g. `FAILED_PRECONDITION`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Look up a code by its upper-case gRPC name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.as_str() == name)
    }

    /// HTTP status used when rendering a rejection to the event sender
    pub fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Cancelled => 499,
            Self::Unknown => 500,
            Self::InvalidArgument => 400,
            Self::DeadlineExceeded => 504,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::PermissionDenied => 403,
            Self::ResourceExhausted => 429,
            Self::FailedPrecondition => 412,
            Self::Aborted => 409,
            Self::OutOfRange => 400,
            Self::Unimplemented => 501,
            Self::Internal => 500,
            Self::Unavailable => 503,
            Self::DataLoss => 500,
            Self::Unauthenticated => 401,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCode {
            Number(u32),
            Name(String),
        }

        match RawCode::deserialize(deserializer)? {
            RawCode::Number(n) => StatusCode::from_u32(n)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid status code: {}", n))),
            RawCode::Name(name) => StatusCode::from_name(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid status code: {:?}", name))),
        }
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
