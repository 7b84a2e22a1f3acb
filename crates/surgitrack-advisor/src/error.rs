//! Error types for the advisory client.
//!
//! None of these reach an operator as a failure: [`crate::Advisor::advise`]
//! turns every one of them into a soft, displayable fallback.

/// Errors raised while configuring or calling the advisory service.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// No API key is configured; the advisor is disabled.
    #[error("advisor is not configured")]
    NotConfigured,

    /// Advisor environment settings are invalid.
    #[error("advisor config error: {0}")]
    Config(String),

    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// The backend was unreachable or returned an error status.
    #[error("advisory backend error: {0}")]
    Backend(String),

    /// The backend did not answer within the deadline.
    #[error("advisory call timed out after {timeout_ms} ms")]
    Timeout {
        /// The configured deadline.
        timeout_ms: u64,
    },

    /// The response text is not an `{analysis, recommendations}` object.
    #[error("advice parse error: {0}")]
    Parse(String),

    /// The summary could not be serialized.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
