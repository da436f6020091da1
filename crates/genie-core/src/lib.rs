//! Token registry, interaction detection, and session orchestration for
//! Mood Genie.
//!
//! A session is a surface of emotion tokens. Words submitted by the user are
//! classified by the oracle and become tokens; dragging a token onto another
//! fuses them, and dragging a token into the center materializes it as an
//! aura.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `genie-config.yaml` into
//!   strongly-typed structs.
//! - [`detector`] -- Pure classification of a drop into move, fuse, or
//!   materialize.
//! - [`registry`] -- The insertion-ordered token store and the aura slot.
//! - [`session`] -- [`Session`], which sequences gestures, oracle calls, and
//!   registry mutations.
//!
//! [`Session`]: session::Session

pub mod config;
pub mod detector;
pub mod registry;
pub mod session;

pub use config::{ConfigError, GenieConfig};
pub use detector::Thresholds;
pub use registry::{NewToken, TokenRegistry};
pub use session::{DragOutcome, Session, SessionError, SessionSettings, SubmitOutcome};
