use crate::sbom_processing::domain::Dialect;
use crate::shared::Result;
use async_trait::async_trait;
use std::path::Path;

/// FormatConverter port for the external dialect converter
///
/// Converts the document at `input` from one dialect to another and writes
/// the result to `output`. Implementations treat the conversion itself as a
/// black box.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// # Errors
    /// Returns `ConversionFailure` when the converter cannot be started,
    /// exits unsuccessfully, or produces no output
    async fn convert(&self, input: &Path, from: Dialect, to: Dialect, output: &Path)
        -> Result<()>;
}
