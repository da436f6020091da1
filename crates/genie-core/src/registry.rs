//! The token registry: live tokens plus the single materialized slot.
//!
//! A plain data container with no knowledge of the oracle or of gestures.
//! Tokens are kept in insertion order, which the interaction detector
//! relies on for its first-match rule. No operation fails: removing an
//! absent id is a no-op, and a colliding id on insert is replaced by a
//! fresh one.

use genie_types::{AuraState, EmotionToken, Position, TokenId};

/// A token about to be added to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewToken {
    /// Requested id; a fresh one is minted when absent or already taken.
    pub id: Option<TokenId>,
    /// Display name of the emotion.
    pub label: String,
    /// Representative emoji.
    pub emoji: String,
    /// Accent color.
    pub color_hex: String,
    /// Initial location.
    pub position: Position,
}

/// Live tokens and the materialized aura.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Vec<EmotionToken>,
    materialized: Option<AuraState>,
}

impl TokenRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            tokens: Vec::new(),
            materialized: None,
        }
    }

    /// Add a token and return it as stored.
    pub fn add(&mut self, new: NewToken) -> EmotionToken {
        let id = match new.id {
            Some(id) if !self.contains(id) => id,
            _ => self.fresh_id(),
        };
        let token = EmotionToken {
            id,
            label: new.label,
            emoji: new.emoji,
            color_hex: new.color_hex,
            position: new.position,
        };
        self.tokens.push(token.clone());
        token
    }

    /// Remove a token, returning it if it was present.
    pub fn remove(&mut self, id: TokenId) -> Option<EmotionToken> {
        let index = self.tokens.iter().position(|t| t.id == id)?;
        Some(self.tokens.remove(index))
    }

    /// Move a token. Returns `false` if the id is unknown.
    pub fn update_position(&mut self, id: TokenId, position: Position) -> bool {
        self.tokens
            .iter_mut()
            .find(|t| t.id == id)
            .map(|t| t.position = position)
            .is_some()
    }

    /// Replace the materialized aura, returning the previous one.
    pub fn set_materialized(&mut self, aura: Option<AuraState>) -> Option<AuraState> {
        std::mem::replace(&mut self.materialized, aura)
    }

    /// The materialized aura, if any.
    pub const fn materialized(&self) -> Option<&AuraState> {
        self.materialized.as_ref()
    }

    /// All live tokens in insertion order.
    pub fn all(&self) -> &[EmotionToken] {
        &self.tokens
    }

    /// Look up a token.
    pub fn get(&self, id: TokenId) -> Option<&EmotionToken> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Whether a token with this id is live.
    pub fn contains(&self, id: TokenId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no live tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn fresh_id(&self) -> TokenId {
        loop {
            let id = TokenId::new();
            if !self.contains(id) {
                return id;
            }
        }
    }
}
