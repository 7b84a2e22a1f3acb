//! Advisor settings, read from the environment only.
//!
//! The API key never lives in `surgitrack-config.yaml`. Without
//! `ADVISOR_API_KEY` the advisor stays disabled and every request gets the
//! "not configured" fallback.

use std::time::Duration;

use crate::error::AdvisorError;

/// Default request deadline.
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Settings for the advisory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// Which API dialect to speak.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Deadline for one advisory call.
    pub timeout: Duration,
}

/// Supported API dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in `ADVISOR_BACKEND`.
    pub fn parse(name: &str) -> Result<Self, AdvisorError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(AdvisorError::Config(format!("unknown backend type: {other}"))),
        }
    }

    /// API base URL used when `ADVISOR_API_URL` is unset.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

impl AdvisorConfig {
    /// Load from process environment variables.
    ///
    /// - `ADVISOR_API_KEY` -- required; absent or empty disables the advisor
    /// - `ADVISOR_BACKEND` -- `openai` (default) or `anthropic`
    /// - `ADVISOR_API_URL` -- base URL (default per backend)
    /// - `ADVISOR_MODEL` -- model name (default `gpt-4o-mini`)
    /// - `ADVISOR_TIMEOUT_MS` -- request deadline (default 15000)
    ///
    /// Returns `Ok(None)` when no key is set.
    pub fn from_env() -> Result<Option<Self>, AdvisorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, AdvisorError> {
        let Some(api_key) = lookup("ADVISOR_API_KEY").filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };

        let backend_type = lookup("ADVISOR_BACKEND")
            .map_or(Ok(BackendType::OpenAi), |name| BackendType::parse(&name))?;
        let api_url = lookup("ADVISOR_API_URL")
            .unwrap_or_else(|| backend_type.default_api_url().to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = lookup("ADVISOR_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_owned());
        let timeout_ms: u64 = lookup("ADVISOR_TIMEOUT_MS")
            .map_or(Ok(DEFAULT_TIMEOUT_MS), |raw| raw.trim().parse())
            .map_err(|e| AdvisorError::Config(format!("invalid ADVISOR_TIMEOUT_MS: {e}")))?;

        Ok(Some(Self {
            backend_type,
            api_url,
            api_key,
            model,
            timeout: Duration::from_millis(timeout_ms),
        }))
    }
}
