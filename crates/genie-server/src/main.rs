//! Mood Genie session server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `genie-config.yaml` (or `GENIE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the oracle client for the configured backend
//! 4. Create the session and serve the API until `Ctrl-C`

use std::path::PathBuf;

use genie_core::config::{ConfigError, GenieConfig, LoggingConfig};
use genie_core::{Session, SessionSettings};
use genie_oracle::{OracleClient, OracleError};
use genie_server::{AppState, ServerError, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "genie-config.yaml";

/// Top-level error for the `genie` binary.
#[derive(Debug, thiserror::Error)]
enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The oracle client could not be built.
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying oracle error.
        #[from]
        source: OracleError,
    },

    /// The HTTP server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::var("GENIE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = GenieConfig::from_file(&config_path)?;

    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        backend = config.oracle.backend,
        port = config.server.port,
        "genie starting"
    );

    let oracle = OracleClient::from_config(&config.oracle)?;
    if config.oracle.api_key.is_empty() {
        warn!("No oracle API key configured, oracle calls will fail");
    }
    info!(
        backend = oracle.backend_name(),
        model = oracle.model(),
        "Oracle client ready"
    );

    let session = Session::new(oracle, SessionSettings::from_config(&config));
    let state = std::sync::Arc::new(AppState::new(session));

    start_server(&config.server, state).await?;
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}
