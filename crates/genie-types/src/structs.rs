//! Core entity structs for the token surface.
//!
//! Covers [`Position`], [`EmotionToken`], and the single materialized
//! [`AuraState`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::TokenId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point on the 2D surface, in surface units (CSS pixels for the web UI).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate, growing to the right.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both coordinates are finite numbers.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ---------------------------------------------------------------------------
// EmotionToken
// ---------------------------------------------------------------------------

/// A draggable token representing one emotion.
///
/// Owned by the token registry; everything else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct EmotionToken {
    /// Unique id within the registry.
    pub id: TokenId,
    /// Display name of the emotion, as returned by the oracle.
    pub label: String,
    /// A single emoji representing the emotion.
    pub emoji: String,
    /// Accent color in `#RRGGBB` (or `#RGB`) form.
    pub color_hex: String,
    /// Current location on the surface.
    pub position: Position,
}

// ---------------------------------------------------------------------------
// AuraState
// ---------------------------------------------------------------------------

/// Palette used when the oracle does not return four usable colors.
pub const DEFAULT_AURA_COLORS: [&str; 4] = ["#0a0a0c", "#121215", "#0a0a0c", "#18181c"];

/// Animation speed used when the oracle does not return a usable speed.
pub const DEFAULT_AURA_SPEED: u8 = 5;

/// The materialized "aura" of an emotion. At most one exists per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct AuraState {
    /// The emotion this aura was materialized from.
    pub source_emotion: String,
    /// Exactly four gradient stops, in order.
    pub colors: [String; 4],
    /// Animation speed from 1 (calm) to 10 (frantic).
    pub speed: u8,
    /// Whether the emotion is unstable and should animate erratically.
    pub chaotic: bool,
    /// Short ironic line about the emotion, when the oracle produced one.
    pub tagline: Option<String>,
}

impl AuraState {
    /// The neutral palette as owned strings.
    pub fn default_colors() -> [String; 4] {
        DEFAULT_AURA_COLORS.map(str::to_owned)
    }
}

/// Whether `s` is a `#RGB` or `#RRGGBB` hex color.
pub fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}
