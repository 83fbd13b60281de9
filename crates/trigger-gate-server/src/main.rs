//! # Trigger Gate Server
//!
//! Binary entry point for the interceptor HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Registers the enabled built-in interceptors
//! - Serves them until SIGINT or SIGTERM

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trigger_gate_server::{start_server, AppState, LoggingConfig, ServerConfig};

/// Exit code for configuration that cannot be loaded or is invalid
const EXIT_CONFIGURATION: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging settings live in the configuration, so it is loaded first and
    // any load failure is reported once a default subscriber is installed.
    let loaded = load_config();

    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(
                error = %e,
                "Could not load server configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    info!("Starting Trigger Gate Server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Server configuration is invalid; aborting");
        std::process::exit(EXIT_CONFIGURATION);
    }

    let secrets = Arc::new(config.secret_store());
    let state = AppState::from_config(config, secrets);

    if let Err(e) = start_server(state).await {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(e.exit_code());
    }

    info!("Server shut down");
    Ok(())
}

/// Load configuration.
///
/// Sources, later overriding earlier:
///  1. `/etc/trigger-gate/server.yaml`
///  2. `./config/server.yaml`
///  3. the file named by `TG_CONFIG_FILE`, which must exist when set
///  4. environment variables prefixed `TG__`, e.g. `TG__SERVER__PORT=9090`
///     or `TG__INTERCEPTORS__ENABLED=github,gitlab`
///
/// Absent files are fine; a malformed file or a value of the wrong type is
/// an error.
fn load_config() -> Result<ServerConfig, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/trigger-gate/server")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/server")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Ok(explicit_path) = std::env::var("TG_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            builder = builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }
    }

    builder
        .add_source(
            config::Environment::with_prefix("TG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("interceptors.enabled"),
        )
        .build()?
        .try_deserialize()
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.default_directives().into());

    let json = logging.json_format;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
