//! Interaction events derived from drag gestures.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::TokenId;
use crate::structs::Position;

/// What a drag end means for the session.
///
/// Produced by the interaction detector and consumed exactly once by the
/// session orchestrator. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum InteractionEvent {
    /// Plain reposition of a token.
    Move {
        /// The dragged token.
        token_id: TokenId,
        /// Where it was dropped.
        new_pos: Position,
    },
    /// The token was dropped inside the center zone.
    Materialize {
        /// The dragged token.
        token_id: TokenId,
    },
    /// The token was dropped onto another token.
    Fuse {
        /// The dragged token.
        token_a: TokenId,
        /// The token it landed on.
        token_b: TokenId,
    },
}

impl InteractionEvent {
    /// Short lowercase name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Materialize { .. } => "materialize",
            Self::Fuse { .. } => "fuse",
        }
    }
}
