//! # Signature Verification
//!
//! Source-control providers sign webhook deliveries in slightly different
//! ways. All of them fit one shape: a header carrying a keyed digest (or the
//! shared token itself), an optional algorithm prefix on that value, and a
//! header naming the event type. [`ProviderPolicy`] captures that shape and
//! [`SignatureVerifier`] applies it.
//!
//! # Presets
//!
//! | Preset | Signature header | Algorithm | Prefix | Event header |
//! |--------|------------------|-----------|--------|--------------|
//! | `github` | `X-Hub-Signature` | HMAC-SHA1 | `sha1=` | `X-Github-Event` |
//! | `github-sha256` | `X-Hub-Signature-256` | HMAC-SHA256 | `sha256=` | `X-Github-Event` |
//! | `bitbucket` | `X-Hub-Signature` | HMAC-SHA256 | `sha256=` | `X-Event-Key` |
//! | `gitlab` | `X-Gitlab-Token` | shared token | none | `X-Gitlab-Event` |
//!
//! All comparisons run in constant time.

use crate::{
    headers::{first_value, Headers},
    secrets::SecretBytes,
    ValidationError,
};
use hmac::{digest::KeyInit, Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

// ============================================================================
// ProviderPolicy
// ============================================================================

/// How the signature header value is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// Hex-encoded HMAC-SHA1 of the body
    Sha1,
    /// Hex-encoded HMAC-SHA256 of the body
    Sha256,
    /// The header carries the shared secret verbatim
    Token,
}

/// Per-provider verification parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPolicy {
    /// Preset name, also the path the built-in interceptor is served under
    pub name: String,

    /// Header that carries the signature or token
    pub signature_header: String,

    pub algorithm: DigestAlgorithm,

    /// Tag preceding the hex digest, e.g. `sha1=`
    #[serde(default)]
    pub signature_prefix: Option<String>,

    /// Header that names the event type
    pub event_type_header: String,
}

impl ProviderPolicy {
    /// Names accepted by [`ProviderPolicy::preset`]
    pub const PRESET_NAMES: [&'static str; 4] = ["github", "github-sha256", "bitbucket", "gitlab"];

    pub fn github() -> Self {
        Self {
            name: "github".to_string(),
            signature_header: "X-Hub-Signature".to_string(),
            algorithm: DigestAlgorithm::Sha1,
            signature_prefix: Some("sha1=".to_string()),
            event_type_header: "X-Github-Event".to_string(),
        }
    }

    pub fn github_sha256() -> Self {
        Self {
            name: "github-sha256".to_string(),
            signature_header: "X-Hub-Signature-256".to_string(),
            algorithm: DigestAlgorithm::Sha256,
            signature_prefix: Some("sha256=".to_string()),
            event_type_header: "X-Github-Event".to_string(),
        }
    }

    pub fn bitbucket() -> Self {
        Self {
            name: "bitbucket".to_string(),
            signature_header: "X-Hub-Signature".to_string(),
            algorithm: DigestAlgorithm::Sha256,
            signature_prefix: Some("sha256=".to_string()),
            event_type_header: "X-Event-Key".to_string(),
        }
    }

    pub fn gitlab() -> Self {
        Self {
            name: "gitlab".to_string(),
            signature_header: "X-Gitlab-Token".to_string(),
            algorithm: DigestAlgorithm::Token,
            signature_prefix: None,
            event_type_header: "X-Gitlab-Event".to_string(),
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "github" => Some(Self::github()),
            "github-sha256" => Some(Self::github_sha256()),
            "bitbucket" => Some(Self::bitbucket()),
            "gitlab" => Some(Self::gitlab()),
            _ => None,
        }
    }
}

// ============================================================================
// SignatureVerifier
// ============================================================================

/// Verifies body signatures and event-type allow-lists for one provider.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    policy: ProviderPolicy,
}

impl SignatureVerifier {
    pub fn new(policy: ProviderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    /// Verify an event, reading the signature and event type from `headers`.
    ///
    /// Returns the body unchanged on success.
    pub fn verify<'a>(
        &self,
        body: &'a [u8],
        headers: &Headers,
        secret: Option<&SecretBytes>,
        event_types: Option<&[String]>,
    ) -> Result<&'a [u8], ValidationError> {
        self.verify_parts(
            body,
            secret.map(SecretBytes::expose),
            first_value(headers, &self.policy.signature_header),
            first_value(headers, &self.policy.event_type_header),
            event_types,
        )
    }

    /// Verify an event from already extracted header values.
    ///
    /// - No secret: the signature check passes regardless of `signature`.
    /// - Secret: `signature` must be present, carry the policy's prefix,
    ///   decode as hex and match the keyed digest of `body`.
    /// - Non-empty `event_types`: `event_type` must equal one entry exactly.
    ///
    /// Both checks must pass. Returns the body unchanged on success.
    pub fn verify_parts<'a>(
        &self,
        body: &'a [u8],
        secret: Option<&[u8]>,
        signature: Option<&str>,
        event_type: Option<&str>,
        event_types: Option<&[String]>,
    ) -> Result<&'a [u8], ValidationError> {
        if let Some(secret) = secret {
            self.check_signature(body, secret, signature)?;
        }

        if let Some(allowed) = event_types.filter(|allowed| !allowed.is_empty()) {
            self.check_event_type(event_type, allowed)?;
        }

        Ok(body)
    }

    /// Produce the header value a sender holding `secret` would attach.
    pub fn sign(&self, secret: &[u8], body: &[u8]) -> Result<String, ValidationError> {
        let prefix = self.policy.signature_prefix.as_deref().unwrap_or("");
        let digest = match self.policy.algorithm {
            DigestAlgorithm::Sha1 => compute_mac::<Hmac<Sha1>>(secret, body)?,
            DigestAlgorithm::Sha256 => compute_mac::<Hmac<Sha256>>(secret, body)?,
            DigestAlgorithm::Token => return Ok(String::from_utf8_lossy(secret).into_owned()),
        };
        Ok(format!("{}{}", prefix, hex::encode(digest)))
    }

    fn check_signature(
        &self,
        body: &[u8],
        secret: &[u8],
        signature: Option<&str>,
    ) -> Result<(), ValidationError> {
        let header = &self.policy.signature_header;
        let signature = signature.ok_or_else(|| ValidationError::MissingSignature {
            header: header.clone(),
        })?;

        if self.policy.algorithm == DigestAlgorithm::Token {
            return if bool::from(signature.as_bytes().ct_eq(secret)) {
                Ok(())
            } else {
                Err(ValidationError::SignatureMismatch {
                    header: header.clone(),
                })
            };
        }

        let hex_part = match self.policy.signature_prefix.as_deref() {
            Some(prefix) => signature.strip_prefix(prefix).ok_or_else(|| {
                ValidationError::InvalidSignatureFormat {
                    header: header.clone(),
                    message: format!("signature must start with '{}'", prefix),
                }
            })?,
            None => signature,
        };

        let expected =
            hex::decode(hex_part).map_err(|e| ValidationError::InvalidSignatureFormat {
                header: header.clone(),
                message: format!("signature is not valid hex: {}", e),
            })?;

        let matches = match self.policy.algorithm {
            DigestAlgorithm::Sha1 => verify_mac::<Hmac<Sha1>>(secret, body, &expected)?,
            DigestAlgorithm::Sha256 => verify_mac::<Hmac<Sha256>>(secret, body, &expected)?,
            DigestAlgorithm::Token => false,
        };

        if matches {
            Ok(())
        } else {
            Err(ValidationError::SignatureMismatch {
                header: header.clone(),
            })
        }
    }

    fn check_event_type(
        &self,
        event_type: Option<&str>,
        allowed: &[String],
    ) -> Result<(), ValidationError> {
        let event_type = event_type.ok_or_else(|| ValidationError::MissingEventType {
            header: self.policy.event_type_header.clone(),
        })?;

        if allowed.iter().any(|candidate| candidate == event_type) {
            Ok(())
        } else {
            Err(ValidationError::EventTypeNotAllowed {
                event_type: event_type.to_string(),
                allowed: allowed.to_vec(),
            })
        }
    }
}

fn new_mac<M: Mac + KeyInit>(secret: &[u8], body: &[u8]) -> Result<M, ValidationError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret).map_err(|e| {
        ValidationError::InvalidSecret {
            message: e.to_string(),
        }
    })?;
    mac.update(body);
    Ok(mac)
}

fn compute_mac<M: Mac + KeyInit>(secret: &[u8], body: &[u8]) -> Result<Vec<u8>, ValidationError> {
    Ok(new_mac::<M>(secret, body)?.finalize().into_bytes().to_vec())
}

fn verify_mac<M: Mac + KeyInit>(
    secret: &[u8],
    body: &[u8],
    expected: &[u8],
) -> Result<bool, ValidationError> {
    Ok(new_mac::<M>(secret, body)?.verify_slice(expected).is_ok())
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
