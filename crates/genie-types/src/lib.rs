//! Shared type definitions for Mood Genie.
//!
//! This crate is the single source of truth for the data that flows between
//! the oracle client, the session core, and the external UI. Types that the
//! UI renders are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for token identifiers
//! - [`structs`] -- Positions, emotion tokens, and the materialized aura
//! - [`events`] -- Interaction events produced from drag gestures
//! - [`oracle`] -- Request and response payloads exchanged with the oracle
//! - [`view`] -- Read-only session projection served to the UI

pub mod events;
pub mod ids;
pub mod oracle;
pub mod structs;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use events::InteractionEvent;
pub use ids::TokenId;
pub use oracle::{Classification, Fusion, OracleRequest};
pub use structs::{AuraState, DEFAULT_AURA_COLORS, DEFAULT_AURA_SPEED, EmotionToken, Position};
pub use view::{NoticeKind, NoticeView, SessionView};

#[cfg(test)]
mod tests {
    //! Binding generation for the UI-facing types.

    #[test]
    fn export_bindings() {
        // Exporting writes the `.ts` files into `bindings/` relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::ids::TokenId::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::EmotionToken::export_all();
        let _ = crate::structs::AuraState::export_all();
        let _ = crate::events::InteractionEvent::export_all();
        let _ = crate::view::NoticeKind::export_all();
        let _ = crate::view::NoticeView::export_all();
        let _ = crate::view::SessionView::export_all();
    }
}
