use super::convert_document::DocumentConverter;
use crate::adapters::outbound::filesystem::document_files;
use crate::application::run_context::RunContext;
use crate::ports::outbound::ProgressReporter;
use crate::sbom_processing::domain::{CycloneDxDocument, Dialect};
use crate::sbom_processing::services::{EnvelopeResolver, FormatDetector};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// NormalizeDocumentUseCase - turns a raw provider artifact into canonical CycloneDX
///
/// Steps: strip the provider envelope, detect the dialect, convert to
/// CycloneDX when needed.
pub struct NormalizeDocumentUseCase {
    converter: DocumentConverter,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl NormalizeDocumentUseCase {
    pub fn new(converter: DocumentConverter, progress_reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            converter,
            progress_reporter,
        }
    }

    /// Writes the document nested under `sbom` to `output`, or copies `input`
    /// through unchanged when there is no envelope
    pub fn unwrap_file(input: &Path, output: &Path) -> Result<()> {
        let document = document_files::read_json(input)?;
        if EnvelopeResolver::is_wrapped(&document) {
            document_files::write_json(output, &EnvelopeResolver::unwrap(document))
        } else {
            document_files::copy_file(input, output)
        }
    }

    /// Detects the dialect of a JSON document on disk
    pub fn detect_file(path: &Path) -> Result<Dialect> {
        let document = document_files::read_json(path)?;
        Ok(FormatDetector::detect(&document))
    }

    /// Produces the canonical CycloneDX file for a raw artifact
    ///
    /// # Returns
    /// Path of the canonical document inside the run context
    pub async fn to_cyclonedx(&self, raw: &Path, context: &RunContext) -> Result<PathBuf> {
        let unwrapped = context.derived(raw, "unwrapped");
        Self::unwrap_file(raw, &unwrapped)?;

        let dialect = Self::detect_file(&unwrapped)?;
        match dialect {
            Dialect::Unknown => self.progress_reporter.report_error(&format!(
                "⚠️  Warning: Could not detect the SBOM format of {}; treating it as SPDX",
                raw.display()
            )),
            known => self
                .progress_reporter
                .report(&format!("🔎 Detected {} document: {}", known, raw.display())),
        }

        let canonical = context.derived(raw, "cdx");
        self.converter
            .convert(&unwrapped, dialect, Dialect::CycloneDx, &canonical)
            .await?;
        Ok(canonical)
    }

    /// Writes the canonical document in the requested output dialect
    pub async fn to_dialect(
        &self,
        canonical: &Path,
        target: Dialect,
        context: &RunContext,
    ) -> Result<PathBuf> {
        if target == Dialect::CycloneDx {
            return Ok(canonical.to_path_buf());
        }

        self.progress_reporter
            .report(&format!("🔄 Converting canonical document to {}...", target));
        let output = context.derived(canonical, "spdx");
        self.converter
            .convert(canonical, Dialect::CycloneDx, target, &output)
            .await?;
        Ok(output)
    }

    /// Parses a canonical file into the document model
    pub fn load_canonical(path: &Path) -> Result<CycloneDxDocument> {
        let value = document_files::read_json(path)?;
        CycloneDxDocument::from_value(value).map_err(|e| {
            PipelineError::MalformedPayload {
                origin: path.display().to_string(),
                details: format!("not a CycloneDX document: {}", e),
            }
            .into()
        })
    }
}
