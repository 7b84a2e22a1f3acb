//! The advisory client with soft-failure semantics.

use std::path::Path;

use serde::Serialize;
use surgitrack_types::Advice;
use tracing::{info, warn};
use ts_rs::TS;

use crate::backend::AdvisorBackend;
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::parse::parse_advice;
use crate::prompt::PromptEngine;

/// What the dashboard receives from an advisory request.
///
/// Always displayable: when the service is missing or fails, `advice`
/// carries a fallback message and `soft_error` says what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AdviceResponse {
    /// The advice, or a fallback.
    pub advice: Advice,
    /// Why the fallback was used, if it was.
    pub soft_error: Option<String>,
}

impl AdviceResponse {
    fn fallback(error: &AdvisorError) -> Self {
        let advice = match error {
            AdvisorError::NotConfigured => Advice {
                analysis: "Clé API manquante.".to_owned(),
                recommendations: vec!["Définissez ADVISOR_API_KEY pour activer le conseiller.".to_owned()],
            },
            AdvisorError::Parse(_) => Advice {
                analysis: "Réponse du conseiller IA illisible.".to_owned(),
                recommendations: vec!["Réessayez dans quelques instants.".to_owned()],
            },
            _ => Advice {
                analysis: "Erreur de connexion au conseiller IA.".to_owned(),
                recommendations: vec!["Vérifiez votre configuration réseau ou quotas.".to_owned()],
            },
        };
        Self {
            advice,
            soft_error: Some(error.to_string()),
        }
    }
}

/// Optional advisory service client.
#[derive(Debug)]
pub struct Advisor {
    backend: Option<(AdvisorBackend, AdvisorConfig)>,
    prompts: PromptEngine,
}

impl Advisor {
    /// Build an advisor. `None` gives a disabled advisor that always
    /// answers with the "not configured" fallback.
    ///
    /// `templates_dir` replaces the built-in prompt templates.
    pub fn new(
        config: Option<AdvisorConfig>,
        templates_dir: Option<&Path>,
    ) -> Result<Self, AdvisorError> {
        let prompts = match templates_dir {
            Some(dir) => PromptEngine::from_dir(dir)?,
            None => PromptEngine::builtin()?,
        };
        let backend = config.map(|config| {
            let backend = AdvisorBackend::from_config(&config);
            info!(backend = backend.name(), model = %config.model, "Advisor enabled");
            (backend, config)
        });
        Ok(Self { backend, prompts })
    }

    /// A disabled advisor.
    pub fn disabled() -> Result<Self, AdvisorError> {
        Self::new(None, None)
    }

    /// Whether a backend is configured.
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Ask for advice on `summary`. Never fails: errors become a fallback
    /// response and a warning.
    pub async fn advise(&self, summary: &impl Serialize) -> AdviceResponse {
        match self.try_advise(summary).await {
            Ok(advice) => AdviceResponse {
                advice,
                soft_error: None,
            },
            Err(e) => {
                if matches!(e, AdvisorError::NotConfigured) {
                    info!("Advisory request while advisor is disabled");
                } else {
                    warn!(error = %e, "Advisory call failed");
                }
                AdviceResponse::fallback(&e)
            }
        }
    }

    /// Ask for advice, surfacing the error.
    pub async fn try_advise(&self, summary: &impl Serialize) -> Result<Advice, AdvisorError> {
        let Some((backend, config)) = &self.backend else {
            return Err(AdvisorError::NotConfigured);
        };
        let prompt = self.prompts.render(summary)?;
        let raw = tokio::time::timeout(config.timeout, backend.complete(&prompt))
            .await
            .map_err(|elapsed| {
                warn!(%elapsed, backend = backend.name(), "Advisory call deadline exceeded");
                AdvisorError::Timeout {
                    timeout_ms: u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            })??;
        parse_advice(&raw)
    }
}
