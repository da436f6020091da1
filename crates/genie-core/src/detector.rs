//! Interaction detection for drag gestures.
//!
//! Decides what a drag end means, purely from geometry. The center zone
//! wins over fusion; among fusion candidates the first token in registry
//! order wins, not the nearest one.

use genie_types::{EmotionToken, InteractionEvent, Position, TokenId};

/// Default radius of the materialize zone around the center.
pub const DEFAULT_CENTER_RADIUS: f64 = 140.0;

/// Default distance under which two tokens fuse.
pub const DEFAULT_FUSE_RADIUS: f64 = 80.0;

/// Distance thresholds used by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Drops strictly closer than this to the center materialize.
    pub center_radius: f64,
    /// Drops strictly closer than this to another token fuse.
    pub fuse_radius: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            center_radius: DEFAULT_CENTER_RADIUS,
            fuse_radius: DEFAULT_FUSE_RADIUS,
        }
    }
}

/// Classify a drop of `token_id` at `drop`.
///
/// `tokens` must be given in registry order; the dragged token itself may
/// be among them and is skipped.
pub fn classify<'a>(
    token_id: TokenId,
    drop: Position,
    tokens: impl IntoIterator<Item = &'a EmotionToken>,
    center: Position,
    thresholds: Thresholds,
) -> InteractionEvent {
    if drop.distance_to(center) < thresholds.center_radius {
        return InteractionEvent::Materialize { token_id };
    }

    tokens
        .into_iter()
        .filter(|other| other.id != token_id)
        .find(|other| drop.distance_to(other.position) < thresholds.fuse_radius)
        .map_or(
            InteractionEvent::Move {
                token_id,
                new_pos: drop,
            },
            |other| InteractionEvent::Fuse {
                token_a: token_id,
                token_b: other.id,
            },
        )
}
