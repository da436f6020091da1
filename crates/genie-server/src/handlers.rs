//! REST API endpoint handlers for the session API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/session` | Current session view |
//! | `POST` | `/api/words` | Submit a word for classification |
//! | `POST` | `/api/tokens/{id}/drop` | End a drag at a position |
//! | `DELETE` | `/api/aura` | Clear the materialized aura |
//! | `DELETE` | `/api/notice` | Dismiss the notice |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use genie_core::{DragOutcome, SubmitOutcome};
use genie_oracle::{Oracle, OracleError};
use genie_types::{AuraState, EmotionToken, NoticeKind, Position, SessionView, TokenId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/words`.
#[derive(Debug, Deserialize)]
pub struct SubmitWordRequest {
    /// The text typed by the user.
    pub text: String,
}

/// Request body for `POST /api/tokens/{id}/drop`.
#[derive(Debug, Deserialize)]
pub struct DropRequest {
    /// Horizontal drop coordinate.
    pub x: f64,
    /// Vertical drop coordinate.
    pub y: f64,
}

/// Oracle failure as reported to clients.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    /// Which notice the failure raised.
    pub kind: NoticeKind,
    /// Diagnostic text of the failure.
    pub detail: String,
}

impl From<OracleError> for FailureBody {
    fn from(err: OracleError) -> Self {
        Self {
            kind: err.notice_kind(),
            detail: err.to_string(),
        }
    }
}

/// What happened to a submitted word.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WordResult {
    /// A token was added.
    Added {
        /// The new token.
        token: EmotionToken,
    },
    /// The oracle judged the word not to be an emotion.
    Rejected {
        /// The normalized word.
        word: String,
    },
    /// The oracle call failed.
    Failed {
        /// The failure.
        failure: FailureBody,
    },
}

impl From<SubmitOutcome> for WordResult {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Added(token) => Self::Added { token },
            SubmitOutcome::Rejected { word } => Self::Rejected { word },
            SubmitOutcome::Failed(err) => Self::Failed {
                failure: err.into(),
            },
        }
    }
}

/// What a drop did.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropResult {
    /// The token moved.
    Moved {
        /// The token at its new position.
        token: EmotionToken,
    },
    /// The token became the aura.
    Materialized {
        /// The new aura.
        aura: AuraState,
    },
    /// Two tokens fused into one.
    Fused {
        /// The consumed tokens.
        consumed: [TokenId; 2],
        /// The fusion result.
        token: EmotionToken,
    },
    /// Tokens were consumed but the oracle failed.
    Lost {
        /// The consumed tokens.
        consumed: Vec<TokenId>,
        /// The failure.
        failure: FailureBody,
    },
}

impl From<DragOutcome> for DropResult {
    fn from(outcome: DragOutcome) -> Self {
        match outcome {
            DragOutcome::Moved(token) => Self::Moved { token },
            DragOutcome::Materialized(aura) => Self::Materialized { aura },
            DragOutcome::Fused { consumed, token } => Self::Fused { consumed, token },
            DragOutcome::Lost { consumed, error } => Self::Lost {
                consumed,
                failure: error.into(),
            },
        }
    }
}

/// Response of the mutating endpoints: the result plus the view after it.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    /// What the action did.
    #[serde(flatten)]
    pub result: T,
    /// The session view after the action completed.
    pub session: SessionView,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/session
// ---------------------------------------------------------------------------

/// Return the current session view.
pub async fn get_session<O: Oracle>(State(state): State<Arc<AppState<O>>>) -> Json<SessionView> {
    Json(state.session.view())
}

// ---------------------------------------------------------------------------
// POST /api/words
// ---------------------------------------------------------------------------

/// Submit a word for classification.
///
/// Responds once the oracle has answered. A rejection or oracle failure is
/// a successful response whose `outcome` says so; only requests the session
/// refuses outright are errors. The flow runs on its own task, so a client
/// that disconnects early does not cancel it.
pub async fn submit_word<O: Oracle + 'static>(
    State(state): State<Arc<AppState<O>>>,
    payload: Result<Json<SubmitWordRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<WordResult>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!(text = %request.text, "word submitted");

    let outcome = state
        .session
        .spawn_submit_word(request.text)
        .await??;
    Ok(Json(ActionResponse {
        result: outcome.into(),
        session: state.session.view(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/tokens/{id}/drop
// ---------------------------------------------------------------------------

/// End a drag of token `id` at the given position.
///
/// Consumed tokens are always followed by the oracle's answer, even if the
/// client disconnects before it arrives.
pub async fn drop_token<O: Oracle + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Path(id_str): Path<String>,
    payload: Result<Json<DropRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<DropResult>>, ApiError> {
    let token_id: TokenId = id_str
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid token id '{id_str}': {e}")))?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .session
        .spawn_drag_end(token_id, Position::new(request.x, request.y))
        .await??;
    Ok(Json(ActionResponse {
        result: outcome.into(),
        session: state.session.view(),
    }))
}

// ---------------------------------------------------------------------------
// DELETE /api/aura
// ---------------------------------------------------------------------------

/// Clear the materialized aura. Returns the aura that was showing, if any.
pub async fn clear_aura<O: Oracle>(
    State(state): State<Arc<AppState<O>>>,
) -> Json<serde_json::Value> {
    let cleared = state.session.clear_aura();
    Json(serde_json::json!({ "cleared": cleared }))
}

// ---------------------------------------------------------------------------
// DELETE /api/notice
// ---------------------------------------------------------------------------

/// Dismiss the notice, as when the user starts typing.
pub async fn dismiss_notice<O: Oracle>(
    State(state): State<Arc<AppState<O>>>,
) -> Json<serde_json::Value> {
    let dismissed = state.session.dismiss_notice();
    Json(serde_json::json!({ "dismissed": dismissed }))
}
