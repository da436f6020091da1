//! Shared application state for the session API.

use std::sync::Arc;

use genie_core::Session;
use genie_types::SessionView;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// session is shared so handlers for concurrent requests drive the same
/// token surface.
pub struct AppState<O> {
    /// The session all requests operate on.
    pub session: Arc<Session<O>>,
}

impl<O> AppState<O> {
    /// Create application state around a session.
    pub fn new(session: Session<O>) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Subscribe to the session view published after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionView> {
        self.session.subscribe()
    }
}

impl<O> Clone for AppState<O> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}
