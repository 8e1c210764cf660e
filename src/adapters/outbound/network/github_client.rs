use super::http_client::{build_http_client, truncate_body};
use super::retry::{retry_with_backoff, RetryExhausted, RetryPolicy, Retryable};
use crate::ports::outbound::{FetchOutcome, ProgressReporter, SbomProvider};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Phrases GitHub uses when SBOM generation did not finish in time
const GENERATION_TIMEOUT_MARKERS: [&str; 3] = ["timed out", "failed to generate", "timeout"];

/// Connection and retry settings for the GitHub dependency-graph endpoint
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

/// Why one download attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubFailure {
    Transport(String),
    GenerationTimeout(String),
    EmptyBody,
    InvalidJson(String),
    Api { status: u16, message: String },
}

impl Retryable for GitHubFailure {
    fn is_retryable(&self) -> bool {
        !matches!(self, GitHubFailure::Api { .. })
    }
}

impl std::fmt::Display for GitHubFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHubFailure::Transport(details) => write!(f, "request failed: {}", details),
            GitHubFailure::GenerationTimeout(message) => write!(f, "{}", message),
            GitHubFailure::EmptyBody => write!(f, "empty response body"),
            GitHubFailure::InvalidJson(details) => write!(f, "invalid JSON: {}", details),
            GitHubFailure::Api { status, message } => write!(f, "HTTP {}: {}", status, message),
        }
    }
}

/// Whether an API message means generation timed out upstream
pub fn is_generation_timeout(message: &str) -> bool {
    let lowered = message.to_lowercase();
    GENERATION_TIMEOUT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Classifies an HTTP response from the SBOM endpoint
///
/// A 2xx response succeeds only with a non-empty JSON body that has no
/// top-level `message` field. API errors (any status) whose message says
/// generation timed out are retryable; other API errors are not.
pub fn classify_response(status: u16, body: &str) -> std::result::Result<Value, GitHubFailure> {
    let success = (200..300).contains(&status);

    if success && body.trim().is_empty() {
        return Err(GitHubFailure::EmptyBody);
    }

    let parsed = serde_json::from_str::<Value>(body);

    if success {
        let value = parsed.map_err(|e| GitHubFailure::InvalidJson(e.to_string()))?;
        return match value.get("message").and_then(Value::as_str) {
            Some(message) => Err(api_failure(status, message)),
            None => Ok(value),
        };
    }

    let message = parsed
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| truncate_body(body.trim(), 500));
    Err(api_failure(status, &message))
}

fn api_failure(status: u16, message: &str) -> GitHubFailure {
    if is_generation_timeout(message) {
        GitHubFailure::GenerationTimeout(message.to_string())
    } else {
        GitHubFailure::Api {
            status,
            message: message.to_string(),
        }
    }
}

/// Maps the final failure of a retried download onto the pipeline error
pub fn exhausted_error(exhausted: RetryExhausted<GitHubFailure>, target: &str) -> PipelineError {
    let attempts = exhausted.attempts;
    match exhausted.error {
        GitHubFailure::Transport(details) => PipelineError::TransientNetwork {
            operation: format!("GitHub SBOM download for {}", target),
            details: format!("{} (after {} attempt(s))", details, attempts),
        },
        GitHubFailure::GenerationTimeout(message) => PipelineError::UpstreamGenerationTimeout {
            provider: "GitHub".to_string(),
            attempts,
            details: message,
        },
        GitHubFailure::EmptyBody => PipelineError::MalformedPayload {
            origin: format!("GitHub SBOM endpoint for {}", target),
            details: format!("empty response body after {} attempt(s)", attempts),
        },
        GitHubFailure::InvalidJson(details) => PipelineError::MalformedPayload {
            origin: format!("GitHub SBOM endpoint for {}", target),
            details: format!("{} (after {} attempt(s))", details, attempts),
        },
        GitHubFailure::Api { status, message } => PipelineError::UpstreamApi {
            provider: "GitHub".to_string(),
            status: Some(status),
            message,
        },
    }
}

/// GitHubSbomClient adapter for the dependency-graph SBOM export
///
/// GitHub returns the SBOM wrapped as `{"sbom": {...}}`. The body is written
/// verbatim; unwrapping happens later in the pipeline.
pub struct GitHubSbomClient {
    client: reqwest::Client,
    settings: GitHubSettings,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl GitHubSbomClient {
    pub fn new(settings: GitHubSettings, progress_reporter: Arc<dyn ProgressReporter>) -> Result<Self> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self {
            client,
            settings,
            progress_reporter,
        })
    }

    fn target(&self) -> String {
        format!("{}/{}", self.settings.owner, self.settings.repo)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/repos/{}/{}/dependency-graph/sbom",
            self.settings.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.owner),
            urlencoding::encode(&self.settings.repo)
        )
    }

    async fn attempt_download(&self) -> std::result::Result<(Value, String), GitHubFailure> {
        let response = self
            .client
            .get(self.endpoint())
            .bearer_auth(&self.settings.token)
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| GitHubFailure::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GitHubFailure::Transport(e.to_string()))?;

        let value = classify_response(status, &body)?;
        Ok((value, body))
    }
}

#[async_trait]
impl SbomProvider for GitHubSbomClient {
    fn name(&self) -> &str {
        "github"
    }

    fn default_source(&self) -> String {
        self.target()
    }

    fn table_identifier(&self) -> String {
        self.target()
    }

    async fn fetch(&self, output: &Path) -> Result<FetchOutcome> {
        let target = self.target();
        self.progress_reporter
            .report(&format!("📥 Downloading SBOM for {} from GitHub...", target));

        let reporter = Arc::clone(&self.progress_reporter);
        let max_attempts = self.settings.retry.max_attempts;
        let (_, body) = retry_with_backoff(
            &self.settings.retry,
            |_| self.attempt_download(),
            |attempt, failure, delay| {
                reporter.report_error(&format!(
                    "⚠️  Attempt {}/{} failed: {}. Retrying in {}s...",
                    attempt,
                    max_attempts,
                    failure,
                    delay.as_secs()
                ));
            },
        )
        .await
        .map_err(|exhausted| exhausted_error(exhausted, &target))?;

        std::fs::write(output, body.as_bytes()).map_err(|e| PipelineError::FileWriteError {
            path: output.to_path_buf(),
            details: e.to_string(),
        })?;

        self.progress_reporter
            .report_completion(&format!("✅ Downloaded GitHub SBOM for {}", target));
        Ok(FetchOutcome::Single(output.to_path_buf()))
    }
}
