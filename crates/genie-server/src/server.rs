//! Session HTTP server lifecycle.
//!
//! [`start_server`] binds the configured host and port, serves the router,
//! and drains connections after `Ctrl-C`.

use std::sync::Arc;

use genie_core::config::ServerSettings;
use genie_oracle::Oracle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Serve the session API until `Ctrl-C`.
///
/// `settings.host` may be an IP address or a resolvable host name.
///
/// # Errors
///
/// [`ServerError::Bind`] if the address cannot be resolved or bound, and
/// [`ServerError::Serve`] if serving stops with an I/O error.
pub async fn start_server<O: Oracle + 'static>(
    settings: &ServerSettings,
    state: Arc<AppState<O>>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .map_err(|e| ServerError::Bind {
            address: format!("{}:{}", settings.host, settings.port),
            message: e.to_string(),
        })?;
    let local = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    info!(addr = %local, "Session API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_ctrl_c())
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("Session API stopped");
    Ok(())
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, draining connections"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            warn!(error = %e, "cannot install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Errors from starting or running the session server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("cannot bind {address}: {message}")]
    Bind {
        /// The configured `host:port`.
        address: String,
        /// The underlying I/O error.
        message: String,
    },

    /// Serving stopped with an I/O error.
    #[error("serve error: {0}")]
    Serve(String),
}
