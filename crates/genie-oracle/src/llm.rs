//! HTTP transport to the model behind the oracle.
//!
//! [`LlmBackend`] is a closed enum over the three supported vendor APIs:
//! Gemini `generateContent`, OpenAI-compatible chat completions, and
//! Anthropic Messages. Each variant wraps the same [`HttpBackend`], whose
//! `reqwest` client carries the transport timeout.
//!
//! Every vendor gets the same rendered prompt and must answer with text
//! holding a JSON object; turning that text into payloads is left to
//! [`crate::parse`].

use crate::config::{BackendType, OracleConfig};
use crate::error::OracleError;
use crate::prompt::RenderedPrompt;

// ---------------------------------------------------------------------------
// Backend dispatch
// ---------------------------------------------------------------------------

/// One of the supported model APIs.
pub enum LlmBackend {
    /// Google Gemini `generateContent` API.
    Gemini(HttpBackend),
    /// `/chat/completions` of `OpenAI` or a compatible server.
    OpenAi(HttpBackend),
    /// Anthropic `/messages`.
    Anthropic(HttpBackend),
}

/// Connection details shared by every backend flavour.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmBackend {
    /// Send a rendered prompt and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Unreachable`] if the HTTP call fails or
    /// returns a non-2xx status, and [`OracleError::MalformedResponse`] if
    /// the response text cannot be extracted.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, OracleError> {
        match self {
            Self::Gemini(backend) => complete_gemini(backend, prompt).await,
            Self::OpenAi(backend) => complete_openai(backend, prompt).await,
            Self::Anthropic(backend) => complete_anthropic(backend, prompt).await,
        }
    }

    /// Vendor name used in logs.
    pub const fn name(&self) -> &str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini(b) | Self::OpenAi(b) | Self::Anthropic(b) => &b.model,
        }
    }
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Send a prompt to `{api_url}/models/{model}:generateContent`.
async fn complete_gemini(
    backend: &HttpBackend,
    prompt: &RenderedPrompt,
) -> Result<String, OracleError> {
    let url = format!("{}/models/{}:generateContent", backend.api_url, backend.model);

    let body = serde_json::json!({
        "systemInstruction": {"parts": [{"text": prompt.system}]},
        "contents": [
            {"role": "user", "parts": [{"text": prompt.user}]}
        ],
        "generationConfig": {"responseMimeType": "application/json"}
    });

    let request = backend
        .client
        .post(&url)
        .header("x-goog-api-key", &backend.api_key)
        .json(&body);

    let json = send_json(request, "Gemini").await?;
    extract_gemini_content(&json)
}

/// Extract the text from a Gemini `generateContent` response.
fn extract_gemini_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::MalformedResponse(
                "Gemini response missing candidates[0].content.parts[0].text".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Send a prompt to `{api_url}/chat/completions`.
///
/// Any server speaking the `OpenAI` wire format works, local ones included.
async fn complete_openai(
    backend: &HttpBackend,
    prompt: &RenderedPrompt,
) -> Result<String, OracleError> {
    let url = format!("{}/chat/completions", backend.api_url);

    let body = serde_json::json!({
        "model": backend.model,
        "messages": [
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user}
        ],
        "temperature": 0.9,
        "max_tokens": 512,
        "response_format": {"type": "json_object"}
    });

    let request = backend
        .client
        .post(&url)
        .header("Authorization", format!("Bearer {}", backend.api_key))
        .json(&body);

    let json = send_json(request, "OpenAI").await?;
    extract_openai_content(&json)
}

/// Pull `choices[0].message.content` out of a chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::MalformedResponse(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Send a prompt to `{api_url}/messages`.
///
/// Anthropic takes the system prompt as a top-level field and
/// authenticates with `x-api-key`.
async fn complete_anthropic(
    backend: &HttpBackend,
    prompt: &RenderedPrompt,
) -> Result<String, OracleError> {
    let url = format!("{}/messages", backend.api_url);

    let body = serde_json::json!({
        "model": backend.model,
        "max_tokens": 512,
        "system": prompt.system,
        "messages": [
            {"role": "user", "content": prompt.user}
        ]
    });

    let request = backend
        .client
        .post(&url)
        .header("x-api-key", &backend.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body);

    let json = send_json(request, "Anthropic").await?;
    extract_anthropic_content(&json)
}

/// Pull `content[0].text` out of a Messages response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::MalformedResponse("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Shared transport
// ---------------------------------------------------------------------------

/// Send a request and decode the JSON envelope.
///
/// Connection failures, timeouts, and non-2xx statuses are all
/// [`OracleError::Unreachable`]; an undecodable body is
/// [`OracleError::MalformedResponse`].
async fn send_json(
    request: reqwest::RequestBuilder,
    vendor: &str,
) -> Result<serde_json::Value, OracleError> {
    let response = request
        .send()
        .await
        .map_err(|e| OracleError::Unreachable(format!("{vendor} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unreadable>".to_owned());
        return Err(OracleError::Unreachable(format!(
            "{vendor} returned {status}: {error_body}"
        )));
    }

    response.json().await.map_err(|e| {
        OracleError::MalformedResponse(format!("{vendor} response parse failed: {e}"))
    })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build the backend selected by `config.backend`.
///
/// # Errors
///
/// Returns [`OracleError::Config`] for an unknown backend name or when the
/// HTTP client cannot be built.
pub fn create_backend(config: &OracleConfig) -> Result<LlmBackend, OracleError> {
    let backend_type = config.backend_type()?;
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| OracleError::Config(format!("failed to build HTTP client: {e}")))?;

    let http = HttpBackend {
        client,
        api_url: config.resolved_api_url()?,
        api_key: config.api_key.clone(),
        model: config.resolved_model()?,
    };

    Ok(match backend_type {
        BackendType::Gemini => LlmBackend::Gemini(http),
        BackendType::OpenAi => LlmBackend::OpenAi(http),
        BackendType::Anthropic => LlmBackend::Anthropic(http),
    })
}
