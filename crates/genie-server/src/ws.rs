//! `WebSocket` stream of session views.
//!
//! A client connecting to `GET /ws/session` first receives the current
//! [`SessionView`], then one JSON text frame per session change. Notice
//! expiry is not pushed; clients hide a notice themselves once its
//! `expiresInMs` has elapsed. A client that falls behind skips straight to
//! the newest view.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use genie_oracle::Oracle;
use genie_types::SessionView;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade to a `WebSocket` and stream session views.
///
/// # Route
///
/// `GET /ws/session`
pub async fn ws_session<O: Oracle + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<O>>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_views(socket, state))
}

/// Whether the connection should stay open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Serialize and send one view. A view that fails to serialize is skipped.
async fn push_view(socket: &mut WebSocket, view: &SessionView) -> Flow {
    let json = match serde_json::to_string(view) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "session view not serializable, skipped");
            return Flow::Continue;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("session stream client gone");
        return Flow::Close;
    }
    Flow::Continue
}

/// React to a frame from the client. The stream is one-way, so only
/// control frames matter.
async fn on_client_frame(
    socket: &mut WebSocket,
    frame: Option<Result<Message, axum::Error>>,
) -> Flow {
    match frame {
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_err() {
                return Flow::Close;
            }
            Flow::Continue
        }
        Some(Ok(Message::Close(_))) | None => {
            debug!("session stream client closed");
            Flow::Close
        }
        Some(Err(e)) => {
            debug!(error = %e, "session stream socket error");
            Flow::Close
        }
        Some(Ok(_)) => Flow::Continue,
    }
}

async fn stream_views<O: Oracle>(mut socket: WebSocket, state: Arc<AppState<O>>) {
    // Subscribe before the snapshot so no change falls between them.
    let mut changes = state.subscribe();
    if push_view(&mut socket, &state.session.view()).await == Flow::Close {
        return;
    }

    loop {
        let flow = tokio::select! {
            change = changes.recv() => match change {
                Ok(view) => push_view(&mut socket, &view).await,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "session stream lagged, resuming at newest view");
                    Flow::Continue
                }
                Err(RecvError::Closed) => Flow::Close,
            },
            frame = socket.recv() => on_client_frame(&mut socket, frame).await,
        };
        if flow == Flow::Close {
            return;
        }
    }
}
