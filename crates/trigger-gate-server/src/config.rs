//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use tracing::warn;
use trigger_gate_core::{adapters::InMemorySecretStore, ProviderPolicy};

/// Service configuration
///
/// Every field carries a serde default, so an empty document (or no
/// configuration source at all) yields a runnable development server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server settings
    pub server: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Which built-in interceptors are served
    pub interceptors: InterceptorsConfig,

    /// Secrets served from configuration instead of a secret store
    pub secrets: Vec<LiteralSecret>,
}

impl ServerConfig {
    /// Check the configuration for values that deserialize but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.interceptors.validate()?;

        for secret in &self.secrets {
            secret.validate()?;
        }

        Ok(())
    }

    /// Build the secret store backing the built-in interceptors.
    ///
    /// Literal secrets are meant for development; each one is announced with
    /// a warning.
    pub fn secret_store(&self) -> InMemorySecretStore {
        let store = InMemorySecretStore::new();

        for secret in &self.secrets {
            warn!(
                namespace = %secret.namespace,
                name = %secret.name,
                keys = secret.data.len(),
                "Serving literal secret from configuration; do not use in production"
            );
            for (key, value) in &secret.data {
                store.insert(
                    secret.namespace.as_str(),
                    secret.name.as_str(),
                    key.as_str(),
                    value.as_str(),
                );
            }
        }

        store
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl HttpConfig {
    /// `host:port` string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "server.host".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level used when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl LoggingConfig {
    /// Filter directives applied when `RUST_LOG` is not set
    pub fn default_directives(&self) -> String {
        format!(
            "trigger_gate_server={level},trigger_gate_core={level},tower_http=debug",
            level = self.level
        )
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Built-in interceptor selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorsConfig {
    /// Provider presets to serve; each is mounted at `POST /{name}`
    pub enabled: Vec<String>,
}

impl InterceptorsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.enabled {
            if ProviderPolicy::preset(name).is_none() {
                return Err(ConfigError::UnknownInterceptor {
                    name: name.clone(),
                    known: ProviderPolicy::PRESET_NAMES
                        .iter()
                        .map(|n| n.to_string())
                        .collect(),
                });
            }
        }
        Ok(())
    }
}

impl Default for InterceptorsConfig {
    fn default() -> Self {
        Self {
            enabled: ProviderPolicy::PRESET_NAMES
                .iter()
                .map(|n| n.to_string())
                .collect(),
        }
    }
}

/// A secret whose values are written directly into configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct LiteralSecret {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    pub name: String,

    /// Secret fields, by key
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl LiteralSecret {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "secrets[].name".to_string(),
            });
        }
        if self.data.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "secret {}/{} has no data entries",
                    self.namespace, self.name
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for LiteralSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.data.keys().collect();
        keys.sort();
        f.debug_struct("LiteralSecret")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("keys", &keys)
            .finish()
    }
}

fn default_namespace() -> String {
    trigger_gate_core::interceptors::DEFAULT_NAMESPACE.to_string()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
