use crate::adapters::outbound::filesystem::document_files;
use crate::ports::outbound::FormatConverter;
use crate::sbom_processing::domain::Dialect;
use crate::sbom_processing::services::SpdxCompatibilityPatch;
use crate::shared::error::PipelineError;
use crate::shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// DocumentConverter - converts working documents between dialects
///
/// Wraps the external converter with the two rules it cannot know about:
/// same-dialect requests never reach it, and SPDX input is patched for
/// converter compatibility first.
pub struct DocumentConverter {
    converter: Arc<dyn FormatConverter>,
}

impl DocumentConverter {
    pub fn new(converter: Arc<dyn FormatConverter>) -> Self {
        Self { converter }
    }

    /// Converts `input` from `from` to `to`, writing `output`
    ///
    /// # Errors
    /// `Validation` for an `Unknown` target, `ConversionFailure` when the
    /// external converter fails
    pub async fn convert(&self, input: &Path, from: Dialect, to: Dialect, output: &Path) -> Result<()> {
        if to == Dialect::Unknown {
            return Err(PipelineError::Validation {
                message: "Cannot convert to an unknown SBOM format".to_string(),
            }
            .into());
        }

        let from = from.for_conversion();
        if from == to {
            return document_files::copy_file(input, output);
        }

        let converter_input = if from == Dialect::Spdx {
            Self::write_compatible_copy(input)?
        } else {
            input.to_path_buf()
        };

        self.converter
            .convert(&converter_input, from, to, output)
            .await
    }

    /// Writes the compatibility-patched SPDX document next to `input`
    fn write_compatible_copy(input: &Path) -> Result<PathBuf> {
        let mut document = document_files::read_json(input)?;
        SpdxCompatibilityPatch::apply(&mut document);

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let patched = input.with_file_name(format!("{}.compat.json", stem));
        document_files::write_json(&patched, &document)?;
        Ok(patched)
    }
}
