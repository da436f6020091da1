//! Error types for the oracle client.
//!
//! Uses `thiserror` for typed errors that surface through the whole oracle
//! pipeline: input validation, prompt rendering, the HTTP call, and
//! response parsing.

use genie_types::NoticeKind;

/// Errors that can occur while consulting the oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not be reached: connection failure, transport
    /// timeout, or a non-2xx status.
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    /// The oracle answered, but the payload did not have the expected shape.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),

    /// The caller supplied input the oracle must not be asked about.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}

impl OracleError {
    /// The user-facing notice category for this failure.
    ///
    /// Everything that is not a transport failure is reported as a
    /// malformed response: from the user's point of view the oracle simply
    /// produced nothing usable.
    pub const fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::Unreachable(_) => NoticeKind::OracleUnreachable,
            Self::MalformedResponse(_)
            | Self::InvalidInput(_)
            | Self::Template(_)
            | Self::Config(_) => NoticeKind::MalformedResponse,
        }
    }
}
