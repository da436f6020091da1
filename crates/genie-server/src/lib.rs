//! Session API server for Mood Genie.
//!
//! This crate provides an Axum HTTP server that exposes one
//! [`Session`](genie_core::Session):
//!
//! - **REST endpoints** to read the session view, submit words, drop
//!   tokens, clear the aura, and dismiss the notice
//! - **`WebSocket` endpoint** (`/ws/session`) that pushes the session view
//!   after every change via [`tokio::sync::broadcast`]
//!
//! The `genie` binary in this crate loads `genie-config.yaml`, installs
//! logging, builds the oracle client, and serves the router.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
