use crate::adapters::outbound::network::{
    GitHubSbomClient, GitHubSettings, MendSbomClient, MendSettings, WizSbomClient, WizSettings,
};
use crate::ports::outbound::{ProgressReporter, SbomProvider};
use crate::shared::Result;
use std::sync::Arc;

/// Validated settings for the provider selected for a run
#[derive(Debug, Clone)]
pub enum ProviderSettings {
    GitHub(GitHubSettings),
    Mend(MendSettings),
    Wiz(WizSettings),
}

impl ProviderSettings {
    /// Provider name as accepted by `--provider`
    pub fn name(&self) -> &'static str {
        match self {
            ProviderSettings::GitHub(_) => "github",
            ProviderSettings::Mend(_) => "mend",
            ProviderSettings::Wiz(_) => "wiz",
        }
    }
}

/// Factory for creating SBOM provider clients
///
/// The provider is chosen at run time from configuration, so clients are
/// handed out as shared trait objects.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates the client for the given settings
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be built
    pub fn create(
        settings: &ProviderSettings,
        progress_reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Arc<dyn SbomProvider>> {
        Ok(match settings {
            ProviderSettings::GitHub(github) => {
                Arc::new(GitHubSbomClient::new(github.clone(), progress_reporter)?)
            }
            ProviderSettings::Mend(mend) => {
                Arc::new(MendSbomClient::new(mend.clone(), progress_reporter)?)
            }
            ProviderSettings::Wiz(wiz) => {
                Arc::new(WizSbomClient::new(wiz.clone(), progress_reporter)?)
            }
        })
    }

    pub fn progress_message(settings: &ProviderSettings) -> &'static str {
        match settings {
            ProviderSettings::GitHub(_) => "🐙 Using the GitHub dependency-graph SBOM export",
            ProviderSettings::Mend(_) => "📦 Using the Mend SBOM export job API",
            ProviderSettings::Wiz(_) => "☁️  Using the Wiz report download",
        }
    }
}
