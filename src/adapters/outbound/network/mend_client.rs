use super::http_client::{build_http_client, truncate_body};
use crate::adapters::outbound::archive::artifact_decoder::{
    extract_zip_json, parse_json_document, sniff, strip_bom, ArtifactKind,
};
use crate::ports::outbound::{FetchOutcome, ProgressReporter, SbomProvider};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const PROVIDER: &str = "Mend";
const REPORT_TYPE: &str = "cycloneDX_1_5";

/// Export scope, in precedence order project > product > organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MendScope {
    Project(String),
    Product(String),
    Organization(String),
}

impl MendScope {
    /// Picks the narrowest configured scope
    pub fn select(project: Option<&str>, product: Option<&str>, org_uuid: &str) -> Self {
        let non_blank = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        non_blank(project)
            .map(MendScope::Project)
            .or_else(|| non_blank(product).map(MendScope::Product))
            .unwrap_or_else(|| MendScope::Organization(org_uuid.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            MendScope::Project(_) => "project",
            MendScope::Product(_) => "product",
            MendScope::Organization(_) => "org",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MendScope::Project(id) | MendScope::Product(id) | MendScope::Organization(id) => id,
        }
    }

    /// Path segment of the export endpoint, e.g. `projects/<id>`
    pub fn path(&self) -> String {
        let collection = match self {
            MendScope::Project(_) => "projects",
            MendScope::Product(_) => "products",
            MendScope::Organization(_) => "orgs",
        };
        format!("{}/{}", collection, urlencoding::encode(self.id()))
    }
}

/// Connection and polling settings for the Mend export API
#[derive(Debug, Clone)]
pub struct MendSettings {
    pub url: String,
    pub email: String,
    pub user_key: String,
    pub org_token: Option<String>,
    pub org_uuid: String,
    pub scope: MendScope,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub token_refresh: Duration,
    pub request_timeout: Duration,
}

/// State of an export job as reported by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Completed,
    Failed(String),
    Pending(String),
}

impl ExportStatus {
    pub fn classify(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "SUCCESS" | "COMPLETED" => ExportStatus::Completed,
            "FAILED" | "CANCELED" | "CANCELLED" => ExportStatus::Failed(status.to_string()),
            _ => ExportStatus::Pending(status.to_string()),
        }
    }
}

/// Polls `check` every `interval` until the job completes, fails or `max_wait` passes
///
/// `check` receives the 1-based poll number. The wait ceiling is measured
/// on the sum of intervals slept, so it does not depend on request latency.
pub async fn poll_until_complete<F, Fut>(
    job_id: &str,
    interval: Duration,
    max_wait: Duration,
    mut check: F,
) -> Result<()>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ExportStatus>>,
{
    let mut waited = Duration::ZERO;
    let mut poll = 1;
    loop {
        match check(poll).await? {
            ExportStatus::Completed => return Ok(()),
            ExportStatus::Failed(status) => {
                return Err(PipelineError::ExportFailed {
                    job_id: job_id.to_string(),
                    status,
                }
                .into());
            }
            ExportStatus::Pending(_) => {}
        }

        if waited + interval > max_wait {
            return Err(PipelineError::ExportTimeout {
                job_id: job_id.to_string(),
                waited_secs: waited.as_secs(),
            }
            .into());
        }

        tokio::time::sleep(interval).await;
        waited += interval;
        poll += 1;
    }
}

/// Reads `retVal.<field>` as a string from a Mend response
pub fn ret_val_string(body: &Value, field: &str) -> Option<String> {
    body.get("retVal")?
        .get(field)?
        .as_str()
        .map(str::to_string)
}

#[derive(Debug, Clone)]
struct CachedToken {
    jwt: String,
    obtained_at: Instant,
}

/// MendSbomClient adapter for the asynchronous SBOM export API
///
/// Flow: login for a refresh token, exchange it for a short-lived access
/// token, start an export job, poll it, then download the artifact. The
/// access token is re-derived before a poll once `token_refresh` has passed.
pub struct MendSbomClient {
    client: reqwest::Client,
    settings: MendSettings,
    token: Mutex<Option<CachedToken>>,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl MendSbomClient {
    pub fn new(settings: MendSettings, progress_reporter: Arc<dyn ProgressReporter>) -> Result<Self> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self {
            client,
            settings,
            token: Mutex::new(None),
            progress_reporter,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v2.0/{}", self.settings.url.trim_end_matches('/'), path)
    }

    fn org_path(&self) -> String {
        format!("orgs/{}", urlencoding::encode(&self.settings.org_uuid))
    }

    async fn send_json(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        let response = request.send().await.map_err(|e| PipelineError::TransientNetwork {
            operation: format!("Mend {}", operation),
            details: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PipelineError::TransientNetwork {
            operation: format!("Mend {}", operation),
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

        Ok(parse_json_document(body.as_bytes(), &format!("Mend {}", operation))?)
    }

    async fn login(&self) -> Result<String> {
        let mut body = json!({
            "email": self.settings.email,
            "userKey": self.settings.user_key,
        });
        if let Some(org_token) = &self.settings.org_token {
            body["orgToken"] = Value::String(org_token.clone());
        }

        let response = self
            .send_json(self.client.post(self.api("login")).json(&body), "login")
            .await?;

        ret_val_string(&response, "refreshToken").ok_or_else(|| {
            PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: None,
                message: "login response has no retVal.refreshToken".to_string(),
            }
            .into()
        })
    }

    async fn derive_access_token(&self, refresh_token: &str) -> Result<String> {
        let request = self
            .client
            .post(self.api("login/accessToken"))
            .header("wss-refresh-token", refresh_token);
        let response = self.send_json(request, "access token exchange").await?;

        ret_val_string(&response, "jwtToken").ok_or_else(|| {
            PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: None,
                message: "access token response has no retVal.jwtToken".to_string(),
            }
            .into()
        })
    }

    /// Returns the cached access token, re-deriving it once it is too old
    async fn access_token(&self) -> Result<String> {
        let cached = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("Mend token cache lock poisoned"))?
            .clone();

        if let Some(token) = cached {
            if token.obtained_at.elapsed() < self.settings.token_refresh {
                return Ok(token.jwt);
            }
            self.progress_reporter
                .report("🔑 Refreshing Mend access token...");
        }

        let refresh_token = self.login().await?;
        let jwt = self.derive_access_token(&refresh_token).await?;

        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("Mend token cache lock poisoned"))? = Some(CachedToken {
            jwt: jwt.clone(),
            obtained_at: Instant::now(),
        });

        Ok(jwt)
    }

    async fn start_export(&self) -> Result<String> {
        let token = self.access_token().await?;
        let url = self.api(&format!(
            "{}/dependencies/reports/SBOM",
            self.settings.scope.path()
        ));
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({"reportType": REPORT_TYPE, "format": "json"}));

        let response = self.send_json(request, "export request").await?;
        ret_val_string(&response, "uuid").ok_or_else(|| {
            PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: None,
                message: "export response has no retVal.uuid".to_string(),
            }
            .into()
        })
    }

    async fn job_status(&self, job_id: &str) -> Result<ExportStatus> {
        let token = self.access_token().await?;
        let url = self.api(&format!(
            "{}/reports/{}",
            self.org_path(),
            urlencoding::encode(job_id)
        ));
        let response = self
            .send_json(self.client.get(url).bearer_auth(token), "report status")
            .await?;

        let status = ret_val_string(&response, "status").unwrap_or_else(|| "UNKNOWN".to_string());
        Ok(ExportStatus::classify(&status))
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>> {
        let token = self.access_token().await?;
        let url = self.api(&format!(
            "{}/reports/download/{}",
            self.org_path(),
            urlencoding::encode(job_id)
        ));

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork {
                operation: "Mend report download".to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::UpstreamApi {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: format!("report download failed for job {}", job_id),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| PipelineError::TransientNetwork {
            operation: "Mend report download".to_string(),
            details: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Selects the SBOM bytes from a Mend artifact: plain JSON or the first JSON member of a zip
pub fn select_mend_document(bytes: &[u8]) -> Result<Vec<u8>> {
    let origin = "Mend report download";
    match sniff(bytes) {
        ArtifactKind::Json => {
            let content = strip_bom(bytes);
            parse_json_document(content, origin)?;
            Ok(content.to_vec())
        }
        ArtifactKind::Zip => extract_zip_json(bytes, origin)?
            .into_iter()
            .next()
            .map(|member| member.bytes)
            .ok_or_else(|| {
                PipelineError::MalformedPayload {
                    origin: origin.to_string(),
                    details: "zip archive contains no JSON document".to_string(),
                }
                .into()
            }),
        kind => Err(PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: format!("unexpected artifact format: {:?}", kind),
        }
        .into()),
    }
}

#[async_trait]
impl SbomProvider for MendSbomClient {
    fn name(&self) -> &str {
        "mend"
    }

    fn default_source(&self) -> String {
        format!("mend-{}-{}", self.settings.scope.label(), self.settings.scope.id())
    }

    fn table_identifier(&self) -> String {
        format!("{}_{}", self.settings.scope.label(), self.settings.scope.id())
    }

    async fn fetch(&self, output: &Path) -> Result<FetchOutcome> {
        self.progress_reporter.report(&format!(
            "📤 Requesting Mend SBOM export for {} {}...",
            self.settings.scope.label(),
            self.settings.scope.id()
        ));
        let job_id = self.start_export().await?;

        let max_polls = (self.settings.max_wait.as_secs()
            / self.settings.poll_interval.as_secs().max(1))
        .max(1) as usize;
        poll_until_complete(
            &job_id,
            self.settings.poll_interval,
            self.settings.max_wait,
            |poll| {
                let job_id = job_id.clone();
                async move {
                    let status = self.job_status(&job_id).await?;
                    self.progress_reporter.report_progress(
                        poll as usize,
                        max_polls,
                        Some(&format!("export job {}", job_id)),
                    );
                    Ok(status)
                }
            },
        )
        .await?;

        self.progress_reporter
            .report("📥 Downloading Mend SBOM report...");
        let artifact = self.download(&job_id).await?;
        let document = select_mend_document(&artifact)?;

        std::fs::write(output, &document).map_err(|e| PipelineError::FileWriteError {
            path: output.to_path_buf(),
            details: e.to_string(),
        })?;

        self.progress_reporter
            .report_completion(&format!("✅ Mend export {} downloaded", job_id));
        Ok(FetchOutcome::Single(output.to_path_buf()))
    }
}
