//! Integration tests for the session API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, with a scripted oracle standing in for the model.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use genie_core::{Session, SessionSettings};
use genie_oracle::{OracleError, ScriptedOracle};
use genie_server::router::build_router;
use genie_server::state::AppState;
use genie_types::{AuraState, Classification, Fusion};
use serde_json::Value;
use tower::ServiceExt;

fn make_state() -> Arc<AppState<ScriptedOracle>> {
    Arc::new(AppState::new(Session::new(
        ScriptedOracle::new(),
        SessionSettings::default(),
    )))
}

fn oracle(state: &AppState<ScriptedOracle>) -> &ScriptedOracle {
    state.session.oracle()
}

fn valid(label: &str) -> Classification {
    Classification::Valid {
        label: label.to_owned(),
        emoji: "😊".to_owned(),
        color_hex: "#FFD700".to_owned(),
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(state: &Arc<AppState<ScriptedOracle>>, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state)).oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn submit(state: &Arc<AppState<ScriptedOracle>>, text: &str) -> (StatusCode, Value) {
    send(state, post_json("/api/words", &serde_json::json!({ "text": text }))).await
}

async fn drop_at(
    state: &Arc<AppState<ScriptedOracle>>,
    id: &str,
    x: f64,
    y: f64,
) -> (StatusCode, Value) {
    send(
        state,
        post_json(
            &format!("/api/tokens/{id}/drop"),
            &serde_json::json!({ "x": x, "y": y }),
        ),
    )
    .await
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn health_returns_ok() {
    let state = make_state();
    let (status, json) = send(&state, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn empty_session_view() {
    let state = make_state();
    let (status, json) = send(
        &state,
        Request::get("/api/session").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tokens"], serde_json::json!([]));
    assert!(json["aura"].is_null());
    assert_eq!(json["loading"], false);
    assert_eq!(json["inputLocked"], false);
    assert!(json["notice"].is_null());
}

#[tokio::test]
async fn submitting_a_valid_word_adds_a_token() {
    let state = make_state();
    oracle(&state).push_classify(Ok(valid("Alegria")));

    let (status, json) = submit(&state, "Alegria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "added");
    assert_eq!(json["token"]["label"], "Alegria");
    assert_eq!(json["token"]["colorHex"], "#FFD700");
    assert_eq!(json["session"]["tokens"].as_array().unwrap().len(), 1);
    assert_eq!(json["session"]["inputLocked"], false);
}

#[tokio::test]
async fn rejected_word_reports_outcome_and_notice() {
    let state = make_state();
    oracle(&state).push_classify(Ok(Classification::Rejected));

    let (status, json) = submit(&state, "mesa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "rejected");
    assert_eq!(json["word"], "mesa");
    assert_eq!(json["session"]["notice"]["kind"], "validation_rejected");
    assert!(json["session"]["notice"]["expiresInMs"].as_u64().unwrap() <= 4_000);
}

#[tokio::test]
async fn oracle_failure_is_reported_not_an_error() {
    let state = make_state();
    oracle(&state).push_classify(Err(OracleError::Unreachable("timeout".to_owned())));

    let (status, json) = submit(&state, "saudade").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["failure"]["kind"], "oracle_unreachable");
    assert_eq!(json["session"]["notice"]["kind"], "oracle_unreachable");
}

#[tokio::test]
async fn phrase_is_a_bad_request() {
    let state = make_state();
    let (status, json) = submit(&state, "muito feliz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("invalid word"));
    assert!(oracle(&state).calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let state = make_state();
    let (status, json) = send(
        &state,
        post_json("/api/words", &serde_json::json!({ "word": "alegria" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn submission_while_locked_is_a_conflict() {
    let state = make_state();
    let gate = oracle(&state).gate_classify();

    let pending = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { submit(&state, "alegria").await })
    };
    while !state.session.view().input_locked {
        tokio::task::yield_now().await;
    }

    let (status, json) = submit(&state, "medo").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);

    assert!(gate.send(Ok(valid("Alegria"))).is_ok());
    let (status, _) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn drop_moves_then_fuses_tokens() {
    let state = make_state();
    oracle(&state).push_classify(Ok(valid("Raiva")));
    let (_, first) = submit(&state, "raiva").await;
    let raiva = first["token"]["id"].as_str().unwrap().to_owned();

    let (status, moved) = drop_at(&state, &raiva, 200.0, 200.0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["outcome"], "moved");
    assert_eq!(moved["token"]["position"]["x"], 200.0);

    oracle(&state).push_classify(Ok(valid("Medo")));
    let (_, second) = submit(&state, "medo").await;
    let medo = second["token"]["id"].as_str().unwrap().to_owned();

    oracle(&state).push_fuse(Ok(Fusion {
        label: "Pânico".to_owned(),
        emoji: "😱".to_owned(),
        color_hex: "#550000".to_owned(),
    }));
    let (status, fused) = drop_at(&state, &raiva, 650.0, 660.0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fused["outcome"], "fused");
    assert_eq!(fused["consumed"], serde_json::json!([raiva, medo]));
    assert_eq!(fused["token"]["label"], "Pânico");
    let tokens = fused["session"]["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 1);
}

#[tokio::test]
async fn fuse_completes_when_client_disconnects() {
    let state = make_state();
    oracle(&state).push_classify(Ok(valid("Raiva")));
    let (_, first) = submit(&state, "raiva").await;
    let raiva = first["token"]["id"].as_str().unwrap().to_owned();
    drop_at(&state, &raiva, 200.0, 200.0).await;
    oracle(&state).push_classify(Ok(valid("Medo")));
    submit(&state, "medo").await;

    let gate = oracle(&state).gate_fuse();
    let request = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { drop_at(&state, &raiva, 650.0, 660.0).await })
    };
    while !state.session.view().input_locked {
        tokio::task::yield_now().await;
    }

    // The client goes away while the oracle is still thinking.
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    assert!(
        gate.send(Ok(Fusion {
            label: "Pânico".to_owned(),
            emoji: "😱".to_owned(),
            color_hex: "#550000".to_owned(),
        }))
        .is_ok()
    );
    while state.session.view().input_locked {
        tokio::task::yield_now().await;
    }

    let view = state.session.view();
    assert_eq!(view.tokens.len(), 1);
    assert_eq!(view.tokens[0].label, "Pânico");
}

#[tokio::test]
async fn drop_in_center_materializes_and_aura_can_be_cleared() {
    let state = make_state();
    oracle(&state).push_classify(Ok(valid("Paz")));
    let (_, added) = submit(&state, "paz").await;
    let paz = added["token"]["id"].as_str().unwrap().to_owned();

    oracle(&state).push_materialize(Ok(AuraState {
        source_emotion: "Paz".to_owned(),
        colors: [
            "#112233".to_owned(),
            "#445566".to_owned(),
            "#778899".to_owned(),
            "#AABBCC".to_owned(),
        ],
        speed: 2,
        chaotic: false,
        tagline: None,
    }));
    let (status, json) = drop_at(&state, &paz, 640.0, 400.0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "materialized");
    assert_eq!(json["aura"]["sourceEmotion"], "Paz");
    assert_eq!(json["session"]["loading"], false);

    let (status, json) = send(
        &state,
        Request::delete("/api/aura").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"]["sourceEmotion"], "Paz");
    assert!(state.session.view().aura.is_none());
}

#[tokio::test]
async fn failed_materialize_reports_lost_token() {
    let state = make_state();
    oracle(&state).push_classify(Ok(valid("Paz")));
    let (_, added) = submit(&state, "paz").await;
    let paz = added["token"]["id"].as_str().unwrap().to_owned();

    oracle(&state).push_materialize(Err(OracleError::Unreachable("down".to_owned())));
    let (status, json) = drop_at(&state, &paz, 640.0, 400.0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "lost");
    assert_eq!(json["consumed"], serde_json::json!([paz]));
    assert_eq!(json["session"]["tokens"], serde_json::json!([]));
    assert!(json["session"]["aura"].is_null());
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let state = make_state();
    let id = genie_types::TokenId::new().to_string();
    let (status, json) = drop_at(&state, &id, 10.0, 10.0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn malformed_token_id_is_a_bad_request() {
    let state = make_state();
    let (status, json) = drop_at(&state, "not-a-uuid", 10.0, 10.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid token id"));
}

#[tokio::test]
async fn dismiss_notice_clears_it() {
    let state = make_state();
    oracle(&state).push_classify(Ok(Classification::Rejected));
    submit(&state, "mesa").await;

    let (status, json) = send(
        &state,
        Request::delete("/api/notice").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dismissed"], true);
    assert!(state.session.view().notice.is_none());

    let (_, json) = send(
        &state,
        Request::delete("/api/notice").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(json["dismissed"], false);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let state = make_state();
    let response = build_router(Arc::clone(&state))
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
