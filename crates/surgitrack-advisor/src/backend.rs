//! HTTP backends for the advisory service.
//!
//! Enum dispatch instead of a trait object, since async methods are not
//! dyn-compatible. Both backends ask for a JSON object and return the raw
//! response text; [`crate::parse`] turns it into an [`Advice`].
//!
//! [`Advice`]: surgitrack_types::Advice

use crate::config::{AdvisorConfig, BackendType};
use crate::error::AdvisorError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens.
const MAX_TOKENS: u32 = 1024;

/// An advisory backend.
#[derive(Debug)]
pub enum AdvisorBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
}

/// Connection settings shared by both API dialects.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    fn new(config: &AdvisorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

impl AdvisorBackend {
    /// Build the backend named by `config`.
    pub fn from_config(config: &AdvisorConfig) -> Self {
        let http = HttpBackend::new(config);
        match config.backend_type {
            BackendType::OpenAi => Self::OpenAi(http),
            BackendType::Anthropic => Self::Anthropic(http),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// Send `prompt` and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Backend`] if the request fails, the status is
    /// not a success, or the text cannot be found in the response.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, AdvisorError> {
        match self {
            Self::OpenAi(http) => complete_openai(http, prompt).await,
            Self::Anthropic(http) => complete_anthropic(http, prompt).await,
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible
// ---------------------------------------------------------------------------

async fn complete_openai(
    http: &HttpBackend,
    prompt: &RenderedPrompt,
) -> Result<String, AdvisorError> {
    let body = serde_json::json!({
        "model": http.model,
        "messages": [
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user}
        ],
        "temperature": 0.2,
        "max_tokens": MAX_TOKENS,
        "response_format": {"type": "json_object"}
    });

    let request = http
        .client
        .post(format!("{}/chat/completions", http.api_url))
        .header("Authorization", format!("Bearer {}", http.api_key))
        .json(&body);
    let json = send(request, "OpenAI").await?;
    extract_openai_content(&json)
}

fn extract_openai_content(json: &serde_json::Value) -> Result<String, AdvisorError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AdvisorError::Backend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages
// ---------------------------------------------------------------------------

async fn complete_anthropic(
    http: &HttpBackend,
    prompt: &RenderedPrompt,
) -> Result<String, AdvisorError> {
    let body = serde_json::json!({
        "model": http.model,
        "max_tokens": MAX_TOKENS,
        "system": prompt.system,
        "messages": [
            {"role": "user", "content": prompt.user}
        ]
    });

    let request = http
        .client
        .post(format!("{}/messages", http.api_url))
        .header("x-api-key", &http.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body);
    let json = send(request, "Anthropic").await?;
    extract_anthropic_content(&json)
}

fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, AdvisorError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AdvisorError::Backend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

async fn send(
    request: reqwest::RequestBuilder,
    vendor: &str,
) -> Result<serde_json::Value, AdvisorError> {
    let response = request
        .send()
        .await
        .map_err(|e| AdvisorError::Backend(format!("{vendor} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("unreadable error body: {e}"));
        return Err(AdvisorError::Backend(format!(
            "{vendor} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AdvisorError::Backend(format!("{vendor} response parse failed: {e}")))
}
