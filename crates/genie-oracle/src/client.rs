//! The oracle seam and its HTTP implementation.
//!
//! [`Oracle`] is what the session core talks to. It has three operations,
//! no retries and no caching: a failure is handed straight back to the
//! caller. [`OracleClient`] implements it on top of an [`LlmBackend`], the
//! prompt templates, and the response parsers.

use std::future::Future;

use genie_types::{AuraState, Classification, Fusion, OracleRequest};
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::{parse_aura, parse_classification, parse_fusion};
use crate::prompt::PromptEngine;

/// A source of semantic judgments about emotions.
///
/// Implementations must be stateless between calls. The returned futures
/// are `Send` so calls can run on any runtime worker.
pub trait Oracle: Send + Sync {
    /// Decide whether `word` names an emotion.
    fn classify(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<Classification, OracleError>> + Send;

    /// Produce the emotion resulting from combining two others.
    fn fuse(
        &self,
        label_a: &str,
        label_b: &str,
    ) -> impl Future<Output = Result<Fusion, OracleError>> + Send;

    /// Produce the aura of an emotion.
    fn materialize(&self, label: &str)
    -> impl Future<Output = Result<AuraState, OracleError>> + Send;
}

/// Normalize a submitted word: trim and lowercase it.
///
/// # Errors
///
/// Returns [`OracleError::InvalidInput`] if the word is empty after trimming
/// or contains internal whitespace.
pub fn validate_word(raw: &str) -> Result<String, OracleError> {
    let word = raw.trim();
    if word.is_empty() {
        return Err(OracleError::InvalidInput("word is empty".to_owned()));
    }
    if word.chars().any(char::is_whitespace) {
        return Err(OracleError::InvalidInput(format!(
            "word must be a single word: {word:?}"
        )));
    }
    Ok(word.to_lowercase())
}

/// [`Oracle`] backed by an LLM HTTP API.
pub struct OracleClient {
    backend: LlmBackend,
    prompts: PromptEngine,
    locale: String,
}

impl OracleClient {
    /// Assemble a client from its parts.
    pub fn new(backend: LlmBackend, prompts: PromptEngine, locale: impl Into<String>) -> Self {
        Self {
            backend,
            prompts,
            locale: locale.into(),
        }
    }

    /// Build a client from configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let backend = create_backend(config)?;
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
        Ok(Self::new(backend, prompts, config.locale.clone()))
    }

    /// Name of the backend in use, for logging.
    pub const fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Model the backend requests.
    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Render, send, and return the raw model text for one request.
    async fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let prompt = self.prompts.render(request, &self.locale)?;
        debug!(
            kind = request.kind(),
            backend = self.backend.name(),
            "consulting oracle"
        );
        self.backend.complete(&prompt).await.inspect_err(|e| {
            warn!(kind = request.kind(), error = %e, "oracle call failed");
        })
    }
}

impl Oracle for OracleClient {
    async fn classify(&self, word: &str) -> Result<Classification, OracleError> {
        let word = validate_word(word)?;
        let text = self.ask(&OracleRequest::Classify { word }).await?;
        parse_classification(&text)
    }

    async fn fuse(&self, label_a: &str, label_b: &str) -> Result<Fusion, OracleError> {
        let request = OracleRequest::Fuse {
            label_a: label_a.to_owned(),
            label_b: label_b.to_owned(),
        };
        let text = self.ask(&request).await?;
        parse_fusion(&text)
    }

    async fn materialize(&self, label: &str) -> Result<AuraState, OracleError> {
        let request = OracleRequest::Materialize {
            label: label.to_owned(),
        };
        let text = self.ask(&request).await?;
        parse_aura(&text, label)
    }
}
