//! Axum router construction for the session API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use genie_oracle::Oracle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for a session.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /ws/session` -- `WebSocket` session view stream
/// - `GET /api/session` -- current session view
/// - `POST /api/words` -- submit a word
/// - `POST /api/tokens/{id}/drop` -- end a drag
/// - `DELETE /api/aura` -- clear the aura
/// - `DELETE /api/notice` -- dismiss the notice
///
/// CORS allows any origin so a browser UI served elsewhere can connect.
pub fn build_router<O: Oracle + 'static>(state: Arc<AppState<O>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/session", get(ws::ws_session::<O>))
        // REST API
        .route("/api/session", get(handlers::get_session::<O>))
        .route("/api/words", post(handlers::submit_word::<O>))
        .route("/api/tokens/{id}/drop", post(handlers::drop_token::<O>))
        .route("/api/aura", delete(handlers::clear_aura::<O>))
        .route("/api/notice", delete(handlers::dismiss_notice::<O>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
