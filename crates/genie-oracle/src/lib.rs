//! Semantic oracle client for Mood Genie.
//!
//! The oracle is a generative text model that judges whether a word is an
//! emotion, fuses two emotions into a third, and turns an emotion into an
//! aura. This crate hides the model behind the [`Oracle`] trait and ships
//! [`OracleClient`], an implementation that talks to Gemini,
//! OpenAI-compatible, or Anthropic APIs, and [`ScriptedOracle`], which answers
//! from a queue for tests.
//!
//! # Architecture
//!
//! ```text
//! request --> PromptEngine --> LlmBackend (HTTP) --> parse --> typed payload
//! ```
//!
//! Each call is a single request/response. Transport failures become
//! [`OracleError::Unreachable`]; unusable answers become
//! [`OracleError::MalformedResponse`].

pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod scripted;

pub use client::{Oracle, OracleClient, validate_word};
pub use config::{BackendType, OracleConfig};
pub use error::OracleError;
pub use scripted::ScriptedOracle;
