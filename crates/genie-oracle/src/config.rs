//! Configuration types for the oracle client.
//!
//! The oracle section of `genie-config.yaml` deserializes into
//! [`OracleConfig`]. Every field has a default, so an empty section selects
//! Gemini with `gemini-2.5-flash`. Secrets are normally
//! supplied through the environment rather than the file.

use std::time::Duration;

use serde::Deserialize;

use crate::error::OracleError;

/// Oracle client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleConfig {
    /// Backend name: `gemini`, `openai` (also `deepseek`, `ollama`), or
    /// `anthropic` (also `claude`).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base API URL. Defaults to the public endpoint of the chosen backend.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Model identifier. Defaults to a small, fast model of the chosen backend.
    #[serde(default)]
    pub model: Option<String>,

    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,

    /// Transport timeout for a single oracle call, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Directory holding template overrides. Built-in templates are used
    /// when unset.
    #[serde(default)]
    pub templates_dir: Option<String>,

    /// Language the oracle should answer in.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            api_url: None,
            model: None,
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            templates_dir: None,
            locale: default_locale(),
        }
    }
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Google Gemini `generateContent` API.
    Gemini,
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Public API root used when no URL is configured.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Model used when none is configured.
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl core::str::FromStr for BackendType {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(OracleError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl OracleConfig {
    /// Parse the configured backend name.
    pub fn backend_type(&self) -> Result<BackendType, OracleError> {
        self.backend.parse()
    }

    /// The API URL to call, without a trailing slash.
    pub fn resolved_api_url(&self) -> Result<String, OracleError> {
        let backend = self.backend_type()?;
        let url = self
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| backend.default_api_url());
        Ok(url.trim_end_matches('/').to_owned())
    }

    /// The model to request.
    pub fn resolved_model(&self) -> Result<String, OracleError> {
        let backend = self.backend_type()?;
        Ok(self
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| backend.default_model())
            .to_owned())
    }

    /// Transport timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Apply overrides from the process environment.
    ///
    /// - `GENIE_ORACLE_BACKEND` overrides `backend`
    /// - `GENIE_ORACLE_API_URL` overrides `api_url`
    /// - `GENIE_ORACLE_MODEL` overrides `model`
    /// - `GENIE_ORACLE_API_KEY` overrides `api_key`; when neither it nor the
    ///   file provide a key, `GEMINI_API_KEY` is used
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("GENIE_ORACLE_BACKEND") {
            self.backend = val;
        }
        if let Some(val) = lookup("GENIE_ORACLE_API_URL") {
            self.api_url = Some(val);
        }
        if let Some(val) = lookup("GENIE_ORACLE_MODEL") {
            self.model = Some(val);
        }
        if let Some(val) = lookup("GENIE_ORACLE_API_KEY") {
            self.api_key = val;
        } else if self.api_key.is_empty()
            && let Some(val) = lookup("GEMINI_API_KEY")
        {
            self.api_key = val;
        }
    }
}

fn default_backend() -> String {
    "gemini".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_locale() -> String {
    "Brazilian Portuguese".to_owned()
}
