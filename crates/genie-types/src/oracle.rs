//! Payloads exchanged with the semantic oracle.
//!
//! The materialize response maps straight onto
//! [`AuraState`](crate::structs::AuraState), so it has no separate type here.

use serde::{Deserialize, Serialize};

/// One request to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OracleRequest {
    /// Is `word` an emotion, and if so how should it look?
    Classify {
        /// The submitted word, lowercased and trimmed.
        word: String,
    },
    /// What emotion results from combining two others?
    Fuse {
        /// Label of the dragged token.
        label_a: String,
        /// Label of the token it was dropped on.
        label_b: String,
    },
    /// Produce the aura for an emotion.
    Materialize {
        /// Label of the token dropped in the center.
        label: String,
    },
}

impl OracleRequest {
    /// Short lowercase name for logging and template lookup.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Classify { .. } => "classify",
            Self::Fuse { .. } => "fuse",
            Self::Materialize { .. } => "materialize",
        }
    }
}

/// The oracle's verdict on a submitted word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    /// The word names an emotion.
    Valid {
        /// Canonical display name.
        label: String,
        /// Representative emoji.
        emoji: String,
        /// Accent color.
        color_hex: String,
    },
    /// The word is not an emotion.
    Rejected,
}

/// The emotion produced by fusing two others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fusion {
    /// Display name of the new emotion.
    pub label: String,
    /// Representative emoji.
    pub emoji: String,
    /// Accent color.
    pub color_hex: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_tagged_by_action() {
        let req = OracleRequest::Fuse {
            label_a: "Raiva".to_owned(),
            label_b: "Medo".to_owned(),
        };
        let json = serde_json::to_value(&req).unwrap_or_default();
        assert_eq!(json["action"], "fuse");
        assert_eq!(json["label_a"], "Raiva");
        assert_eq!(req.kind(), "fuse");
    }
}
