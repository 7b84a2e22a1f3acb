//! Prompt rendering via `minijinja`.
//!
//! The built-in templates ship inside the binary. Operators can replace
//! them by pointing [`PromptEngine::from_dir`] at a directory holding
//! `system.j2` and `summary.j2`.

use std::path::Path;

use minijinja::Environment;
use serde::Serialize;

use crate::error::AdvisorError;

const SYSTEM_TEMPLATE: &str = include_str!("../templates/system.j2");
const SUMMARY_TEMPLATE: &str = include_str!("../templates/summary.j2");

/// A prompt ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message: role and answer format.
    pub system: String,
    /// User message: the block situation.
    pub user: String,
}

/// Loaded prompt templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Engine with the built-in templates.
    pub fn builtin() -> Result<Self, AdvisorError> {
        Self::with_sources(SYSTEM_TEMPLATE.to_owned(), SUMMARY_TEMPLATE.to_owned())
    }

    /// Engine with templates read from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, AdvisorError> {
        Self::with_sources(load_template(dir, "system.j2")?, load_template(dir, "summary.j2")?)
    }

    fn with_sources(system: String, summary: String) -> Result<Self, AdvisorError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| AdvisorError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("summary", summary)
            .map_err(|e| AdvisorError::Template(format!("failed to add summary template: {e}")))?;
        Ok(Self { env })
    }

    /// Render both messages for `summary`.
    ///
    /// Templates see the summary as `summary` and its pretty-printed JSON
    /// as `summary_json`.
    pub fn render(&self, summary: &impl Serialize) -> Result<RenderedPrompt, AdvisorError> {
        let value = serde_json::to_value(summary)?;
        let summary_json = serde_json::to_string_pretty(&value)?;
        let ctx = minijinja::context! {
            summary => minijinja::Value::from_serialize(&value),
            summary_json => summary_json,
        };

        let render = |name: &str| {
            self.env
                .get_template(name)
                .map_err(|e| AdvisorError::Template(format!("missing {name} template: {e}")))?
                .render(&ctx)
                .map_err(|e| AdvisorError::Template(format!("{name} render failed: {e}")))
        };

        Ok(RenderedPrompt {
            system: render("system")?,
            user: render("summary")?,
        })
    }
}

fn load_template(dir: &Path, filename: &str) -> Result<String, AdvisorError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| AdvisorError::Template(format!("failed to read {}: {e}", path.display())))
}
