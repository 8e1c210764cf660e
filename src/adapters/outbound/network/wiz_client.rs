use super::http_client::{build_http_client, truncate_body};
use crate::adapters::outbound::archive::artifact_decoder::{
    extract_zip_json, gunzip, parse_json_document, sniff, strip_bom, ArtifactKind, JsonMember,
};
use crate::ports::outbound::{FetchOutcome, ProgressReporter, SbomProvider};
use crate::sbom_processing::domain::Dialect;
use crate::sbom_processing::services::{EnvelopeResolver, FormatDetector};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "Wiz";
const AUDIENCE: &str = "wiz-api";

const REPORT_QUERY: &str =
    "query ReportLastRun($id: ID!) { report(id: $id) { id name lastRun { status url } } }";

/// Credentials and endpoints for the Wiz report API
#[derive(Debug, Clone)]
pub struct WizSettings {
    pub auth_url: String,
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub report_id: String,
    pub request_timeout: Duration,
}

/// Builds the client-credentials form body
pub fn token_request_body(client_id: &str, client_secret: &str) -> String {
    [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("audience", AUDIENCE),
    ]
    .iter()
    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
    .collect::<Vec<_>>()
    .join("&")
}

/// Extracts `data.report.lastRun.url` from a GraphQL response
///
/// # Errors
/// A non-empty top-level `errors` list, or a report without a completed
/// run, is an `UpstreamApi` error.
pub fn extract_report_url(response: &Value) -> Result<String> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            return Err(PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: None,
                message: format!("GraphQL errors: {}", messages.join("; ")),
            }
            .into());
        }
    }

    response
        .pointer("/data/report/lastRun/url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: None,
                message: "report has no completed run with a download URL".to_string(),
            }
            .into()
        })
}

/// Decodes a Wiz artifact into one or more JSON documents
///
/// Plain JSON and gzip yield one document. A zip yields every member that
/// looks like an SBOM (CycloneDX or SPDX once unwrapped).
pub fn decode_wiz_artifact(bytes: &[u8]) -> Result<Vec<JsonMember>> {
    let origin = "Wiz report download";
    let single = |bytes: &[u8]| -> Result<Vec<JsonMember>> {
        let content = strip_bom(bytes);
        parse_json_document(content, origin)?;
        Ok(vec![JsonMember {
            name: "report.json".to_string(),
            bytes: content.to_vec(),
        }])
    };

    match sniff(bytes) {
        ArtifactKind::Json => single(bytes),
        ArtifactKind::Gzip => single(&gunzip(bytes, origin)?),
        ArtifactKind::Zip => {
            let members: Vec<JsonMember> = extract_zip_json(bytes, origin)?
                .into_iter()
                .filter(|member| is_sbom_member(&member.bytes))
                .collect();
            if members.is_empty() {
                return Err(PipelineError::MalformedPayload {
                    origin: origin.to_string(),
                    details: "zip archive contains no SBOM document".to_string(),
                }
                .into());
            }
            Ok(members)
        }
        ArtifactKind::Unknown => Err(PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: "artifact is neither JSON, gzip nor zip".to_string(),
        }
        .into()),
    }
}

fn is_sbom_member(bytes: &[u8]) -> bool {
    serde_json::from_slice::<Value>(bytes)
        .map(|value| FormatDetector::detect(&EnvelopeResolver::unwrap(value)) != Dialect::Unknown)
        .unwrap_or(false)
}

/// Paths for the members of a multi-document archive, next to `output`
pub fn member_paths(output: &Path, count: usize) -> Vec<PathBuf> {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("wiz-report");
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    (1..=count)
        .map(|i| parent.join(format!("{}-{}.json", stem, i)))
        .collect()
}

/// WizSbomClient adapter for Wiz report downloads
///
/// Resolves the report's last run to a pre-signed URL via GraphQL, then
/// downloads that URL without credentials.
pub struct WizSbomClient {
    client: reqwest::Client,
    settings: WizSettings,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl WizSbomClient {
    pub fn new(settings: WizSettings, progress_reporter: Arc<dyn ProgressReporter>) -> Result<Self> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self {
            client,
            settings,
            progress_reporter,
        })
    }

    async fn read_json(&self, response: reqwest::Response, operation: &str) -> Result<Value> {
        let status = response.status();
        let body = response.text().await.map_err(|e| PipelineError::TransientNetwork {
            operation: format!("Wiz {}", operation),
            details: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: format!("{} failed: {}", operation, truncate_body(&body, 500)),
            }
            .into());
        }

        parse_json_document(body.as_bytes(), &format!("Wiz {}", operation))
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.settings.auth_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(token_request_body(
                &self.settings.client_id,
                &self.settings.client_secret,
            ))
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork {
                operation: "Wiz authentication".to_string(),
                details: e.to_string(),
            })?;

        let body = self.read_json(response, "authentication").await?;
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::UpstreamApi {
                    provider: PROVIDER.to_string(),
                    status: None,
                    message: "token response has no access_token".to_string(),
                }
                .into()
            })
    }

    async fn report_url(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(token)
            .json(&json!({
                "query": REPORT_QUERY,
                "variables": {"id": self.settings.report_id},
            }))
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork {
                operation: "Wiz GraphQL report query".to_string(),
                details: e.to_string(),
            })?;

        let body = self.read_json(response, "GraphQL report query").await?;
        extract_report_url(&body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork {
                operation: "Wiz report download".to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: "signed report URL download failed".to_string(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| PipelineError::TransientNetwork {
            operation: "Wiz report download".to_string(),
            details: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

fn write_member(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| {
        PipelineError::FileWriteError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

#[async_trait]
impl SbomProvider for WizSbomClient {
    fn name(&self) -> &str {
        "wiz"
    }

    fn default_source(&self) -> String {
        format!("wiz-report-{}", self.settings.report_id)
    }

    fn table_identifier(&self) -> String {
        format!("report_{}", self.settings.report_id)
    }

    async fn fetch(&self, output: &Path) -> Result<FetchOutcome> {
        self.progress_reporter.report(&format!(
            "🔐 Authenticating with Wiz for report {}...",
            self.settings.report_id
        ));
        let token = self.access_token().await?;
        let url = self.report_url(&token).await?;

        self.progress_reporter
            .report("📥 Downloading Wiz report from signed URL...");
        let artifact = self.download(&url).await?;
        let members = decode_wiz_artifact(&artifact)?;

        if members.len() == 1 {
            write_member(output, &members[0].bytes)?;
            self.progress_reporter
                .report_completion("✅ Downloaded Wiz report");
            return Ok(FetchOutcome::Single(output.to_path_buf()));
        }

        let paths = member_paths(output, members.len());
        for (member, path) in members.iter().zip(&paths) {
            write_member(path, &member.bytes)?;
        }
        self.progress_reporter.report_completion(&format!(
            "✅ Downloaded Wiz report archive with {} SBOM documents",
            paths.len()
        ));
        Ok(FetchOutcome::Multiple(paths))
    }
}
