//! Read-only session projection for the UI.
//!
//! The UI never sees the registry itself; it renders a [`SessionView`]
//! taken at a single point in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::{AuraState, EmotionToken};

/// Category of the ephemeral message shown under the input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The oracle says the submitted word is not an emotion.
    ValidationRejected,
    /// The oracle could not be reached.
    OracleUnreachable,
    /// The oracle answered with something unusable.
    MalformedResponse,
}

/// A live (not yet expired) notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct NoticeView {
    /// What went wrong.
    pub kind: NoticeKind,
    /// Human-readable text.
    pub message: String,
    /// Wall-clock time the notice was raised.
    pub issued_at: DateTime<Utc>,
    /// Milliseconds until the notice disappears on its own.
    #[ts(type = "number")]
    pub expires_in_ms: u64,
}

/// Everything the UI needs to render the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Live tokens in registry order.
    pub tokens: Vec<EmotionToken>,
    /// The materialized aura, if any.
    pub aura: Option<AuraState>,
    /// Whether a materialization is in flight.
    pub loading: bool,
    /// Whether word submission is currently refused.
    pub input_locked: bool,
    /// The current notice, if it has not expired.
    pub notice: Option<NoticeView>,
}
