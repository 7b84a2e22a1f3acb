//! Optional text-generation advisor for the SurgiTrack dashboard.
//!
//! Sends a serializable summary of the block to an external model and
//! returns `{analysis, recommendations}`. The advisor is never on the
//! scheduling path: a missing key, a network error, a timeout or an
//! unreadable answer all produce a displayable fallback instead of an
//! error.
//!
//! # Modules
//!
//! - [`advisor`] -- [`Advisor`] and the [`AdviceResponse`] it always returns.
//! - [`backend`] -- `OpenAI`-compatible and Anthropic HTTP backends.
//! - [`config`] -- Environment-only settings.
//! - [`error`] -- [`AdvisorError`].
//! - [`parse`] -- Lenient response parsing.
//! - [`prompt`] -- `minijinja` prompt templates.
//!
//! [`AdvisorError`]: error::AdvisorError

pub mod advisor;
pub mod backend;
pub mod config;
pub mod error;
pub mod parse;
pub mod prompt;

pub use advisor::{AdviceResponse, Advisor};
pub use config::AdvisorConfig;
