use crate::ports::outbound::FormatConverter;
use crate::sbom_processing::domain::Dialect;
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Executable used when none is configured
pub const DEFAULT_CONVERTER: &str = "cyclonedx";

/// CycloneDxCliConverter adapter running the `cyclonedx convert` command
pub struct CycloneDxCliConverter {
    executable: PathBuf,
}

impl CycloneDxCliConverter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// The converter's name for a JSON dialect
    pub fn format_argument(dialect: Dialect) -> &'static str {
        match dialect.for_conversion() {
            Dialect::CycloneDx => "json",
            _ => "spdxjson",
        }
    }

    /// Arguments passed to the executable
    pub fn arguments(input: &Path, from: Dialect, to: Dialect, output: &Path) -> Vec<String> {
        vec![
            "convert".to_string(),
            "--input-file".to_string(),
            input.display().to_string(),
            "--input-format".to_string(),
            Self::format_argument(from).to_string(),
            "--output-file".to_string(),
            output.display().to_string(),
            "--output-format".to_string(),
            Self::format_argument(to).to_string(),
        ]
    }
}

impl Default for CycloneDxCliConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

#[async_trait]
impl FormatConverter for CycloneDxCliConverter {
    async fn convert(
        &self,
        input: &Path,
        from: Dialect,
        to: Dialect,
        output: &Path,
    ) -> Result<()> {
        let failure = |details: String| PipelineError::ConversionFailure {
            from: from.name().to_string(),
            to: to.name().to_string(),
            details,
        };

        let result = Command::new(&self.executable)
            .args(Self::arguments(input, from, to, output))
            .output()
            .await
            .map_err(|e| {
                failure(format!(
                    "failed to start '{}': {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(failure(format!(
                "'{}' exited with {}: {}",
                self.executable.display(),
                result.status,
                stderr.trim()
            ))
            .into());
        }

        if !output.is_file() {
            return Err(failure(format!(
                "converter reported success but wrote no output to {}",
                output.display()
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_arguments() {
        assert_eq!(CycloneDxCliConverter::format_argument(Dialect::CycloneDx), "json");
        assert_eq!(CycloneDxCliConverter::format_argument(Dialect::Spdx), "spdxjson");
        assert_eq!(CycloneDxCliConverter::format_argument(Dialect::Unknown), "spdxjson");
    }

    #[test]
    fn test_arguments() {
        let args = CycloneDxCliConverter::arguments(
            Path::new("in.json"),
            Dialect::Spdx,
            Dialect::CycloneDx,
            Path::new("out.json"),
        );
        assert_eq!(
            args,
            vec![
                "convert",
                "--input-file",
                "in.json",
                "--input-format",
                "spdxjson",
                "--output-file",
                "out.json",
                "--output-format",
                "json"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_executable_is_conversion_failure() {
        let temp_dir = TempDir::new().unwrap();
        let converter = CycloneDxCliConverter::new(temp_dir.path().join("no-such-converter"));

        let err = converter
            .convert(
                &temp_dir.path().join("in.json"),
                Dialect::Spdx,
                Dialect::CycloneDx,
                &temp_dir.path().join("out.json"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ConversionFailure { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_conversion_failure() {
        let temp_dir = TempDir::new().unwrap();
        let converter = CycloneDxCliConverter::new("false");

        let err = converter
            .convert(
                &temp_dir.path().join("in.json"),
                Dialect::Spdx,
                Dialect::CycloneDx,
                &temp_dir.path().join("out.json"),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exited with"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_conversion_failure() {
        let temp_dir = TempDir::new().unwrap();
        let converter = CycloneDxCliConverter::new("true");

        let err = converter
            .convert(
                &temp_dir.path().join("in.json"),
                Dialect::Spdx,
                Dialect::CycloneDx,
                &temp_dir.path().join("out.json"),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("wrote no output"));
    }
}
