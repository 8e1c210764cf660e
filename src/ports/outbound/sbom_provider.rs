use crate::shared::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Artifacts written by a provider fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// One SBOM document
    Single(PathBuf),
    /// Several documents from one archive, to be merged
    Multiple(Vec<PathBuf>),
}

impl FetchOutcome {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            FetchOutcome::Single(path) => vec![path.as_path()],
            FetchOutcome::Multiple(paths) => paths.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// SbomProvider port for acquiring raw SBOM artifacts from an upstream service
///
/// Each implementation speaks one provider protocol (plain REST, async export
/// job, signed download URL). Every path returned holds valid JSON that is not
/// an API error envelope.
#[async_trait]
pub trait SbomProvider: Send + Sync {
    /// Provider name used in table names and diagnostics (e.g. "github")
    fn name(&self) -> &str;

    /// Source reference for components of a document that names nothing itself
    fn default_source(&self) -> String;

    /// Target identifier used to derive the destination table name
    fn table_identifier(&self) -> String;

    /// Downloads the SBOM for the configured target
    ///
    /// # Arguments
    /// * `output` - Path to write the artifact to. Multi-document archives
    ///   are written next to it.
    ///
    /// # Errors
    /// Returns a `PipelineError` describing the failure class (network,
    /// upstream API, malformed payload, export failure or timeout)
    async fn fetch(&self, output: &Path) -> Result<FetchOutcome>;
}
