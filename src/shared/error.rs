use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// A run either completes the whole pipeline or fails; there is no
/// partial-success code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The full pipeline completed
    Success = 0,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Any fatal pipeline error (network, conversion, sink, configuration, ...)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// A bulk-merge candidate that was skipped, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub key: String,
    pub reason: String,
}

impl RejectedCandidate {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

fn format_rejected(rejected: &[RejectedCandidate]) -> String {
    if rejected.is_empty() {
        return "   (no objects found)".to_string();
    }
    rejected
        .iter()
        .map(|r| format!("   - {}: {}", r.key, r.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pipeline errors.
///
/// Every variant is fatal for the run. Retry decisions are made by the
/// provider clients before one of these is surfaced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Network error during {operation}\nDetails: {details}\n\n💡 Hint: Check connectivity to the upstream service and retry the run")]
    TransientNetwork { operation: String, details: String },

    #[error("{provider} did not finish generating the SBOM after {attempts} attempt(s)\nDetails: {details}\n\n💡 Hint: Large repositories can exceed the provider's generation limit. Consider the 'mend' or 'wiz' provider for this target")]
    UpstreamGenerationTimeout {
        provider: String,
        attempts: u32,
        details: String,
    },

    #[error("Malformed payload from {origin}\nDetails: {details}\n\n💡 Hint: The upstream returned something that is not a usable SBOM document")]
    MalformedPayload { origin: String, details: String },

    #[error("{provider} API error{}: {message}\n\n💡 Hint: Verify the credentials and target identifiers in the configuration", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    UpstreamApi {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Unsupported SBOM dialect in {path}: {detected}\n\n💡 Hint: Only CycloneDX and SPDX JSON documents are supported")]
    UnsupportedDialect { path: PathBuf, detected: String },

    #[error("Conversion from {from} to {to} failed\nDetails: {details}\n\n💡 Hint: Check that the converter executable is installed and accepts the input document")]
    ConversionFailure {
        from: String,
        to: String,
        details: String,
    },

    #[error("Export job {job_id} ended with status {status}\n\n💡 Hint: Inspect the report in the provider console; the export was not retried")]
    ExportFailed { job_id: String, status: String },

    #[error("Export job {job_id} did not complete within {waited_secs}s\n\n💡 Hint: Increase 'max_wait_secs' for large scopes")]
    ExportTimeout { job_id: String, waited_secs: u64 },

    #[error("No valid CycloneDX documents found in {location}\nRejected candidates:\n{}\n\n💡 Hint: Check the include/exclude patterns and that the stored documents are CycloneDX JSON", format_rejected(.rejected))]
    EmptyCandidateSet {
        location: String,
        rejected: Vec<RejectedCandidate>,
    },

    #[error("Merged document failed validation\nDetails: {details}\n\n💡 Hint: This indicates a bug in the merge step; the output was not written")]
    InvalidMergedDocument { details: String },

    #[error("Object store operation failed for {location}\nDetails: {details}\n\n💡 Hint: Verify the bucket, prefix and credentials")]
    ObjectStoreFailure { location: String, details: String },

    #[error("Failed to prepare table {table}\nDetails: {details}\n\n💡 Hint: The destination may be in an inconsistent state; do not trust its contents for this run")]
    SchemaMigrationFailure { table: String, details: String },

    #[error("Failed to write rows to {table}\nDetails: {details}\n\n💡 Hint: Partial writes are not rolled back; do not trust the destination for this run")]
    SinkWriteFailure { table: String, details: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    /// Validation error for configuration and builder input
    #[error("Validation error: {message}")]
    Validation { message: String },
}
