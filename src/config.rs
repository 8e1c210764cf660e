//! Configuration file support for sbom-collector.
//!
//! Provides YAML-based configuration through `sbom-collector.config.yml` files,
//! environment fallbacks for secrets, and validation into a [`PipelineConfig`].

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::outbound::converter::DEFAULT_CONVERTER;
use crate::adapters::outbound::network::http_client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::adapters::outbound::network::{
    AwsCredentials, ClickHouseSettings, GitHubSettings, MendScope, MendSettings, RetryPolicy,
    S3Settings, WizSettings,
};
use crate::application::dto::PipelineRequest;
use crate::application::factories::{ObjectStoreSettings, ProviderSettings};
use crate::sbom_processing::domain::Dialect;
use crate::sbom_processing::services::CandidateFilter;
use crate::shared::error::PipelineError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "sbom-collector.config.yml";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_WIZ_AUTH_URL: &str = "https://auth.app.wiz.io/oauth/token";
const DEFAULT_CLICKHOUSE_DATABASE: &str = "default";
const DEFAULT_RETRY_DELAY_SECS: u64 = 10;
const DEFAULT_MEND_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_MEND_MAX_WAIT_SECS: u64 = 1800;
const DEFAULT_MEND_TOKEN_REFRESH_SECS: u64 = 25 * 60;

type UnknownFields = HashMap<String, serde_yaml_ng::Value>;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub provider: Option<String>,
    pub output_format: Option<String>,
    /// Path or name of the converter executable
    pub converter: Option<String>,
    /// YAML or JSON file mapping component names to licenses
    pub license_mapping: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub github: Option<GitHubSection>,
    pub mend: Option<MendSection>,
    pub wiz: Option<WizSection>,
    pub storage: Option<StorageSection>,
    pub merge: Option<MergeSection>,
    pub clickhouse: Option<ClickHouseSection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct GitHubSection {
    pub api_url: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub max_attempts: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct MendSection {
    pub url: Option<String>,
    pub email: Option<String>,
    pub user_key: Option<String>,
    pub org_token: Option<String>,
    pub org_uuid: Option<String>,
    pub project_uuid: Option<String>,
    pub product_uuid: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub token_refresh_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct WizSection {
    pub auth_url: Option<String>,
    pub api_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub report_id: Option<String>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct StorageSection {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Directory-backed store used instead of S3
    pub local_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub output_key: Option<String>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct MergeSection {
    pub enabled: Option<bool>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClickHouseSection {
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub table: Option<String>,
    pub truncate: Option<bool>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

/// Command-line values layered over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub merge: bool,
    pub output_format: Option<Dialect>,
    pub output_key: Option<String>,
    /// Comma-separated include patterns
    pub include: Option<String>,
    /// Comma-separated exclude patterns
    pub exclude: Option<String>,
    pub truncate: bool,
}

/// Fully validated configuration for one run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub provider: Option<ProviderSettings>,
    pub object_store: ObjectStoreSettings,
    pub clickhouse: Option<ClickHouseSettings>,
    pub converter: PathBuf,
    pub license_mapping: HashMap<String, String>,
    pub request: PipelineRequest,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate values that can be checked without CLI overrides or the environment.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(ref provider) = config.provider {
        parse_provider_name(provider)?;
    }
    if let Some(ref format) = config.output_format {
        Dialect::from_str(format).map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    }
    if config.request_timeout_secs == Some(0) {
        bail!("Invalid config: request_timeout_secs must be greater than 0.");
    }
    if let Some(ref github) = config.github {
        if github.max_attempts == Some(0) {
            bail!(
                "Invalid config: github.max_attempts must be at least 1.\n\n\
                 💡 Hint: Use 1 to disable retries."
            );
        }
    }
    if let Some(ref mend) = config.mend {
        if mend.poll_interval_secs == Some(0) {
            bail!("Invalid config: mend.poll_interval_secs must be greater than 0.");
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let sections: [(&str, Option<&UnknownFields>); 7] = [
        ("", Some(&config.unknown_fields)),
        ("github.", config.github.as_ref().map(|s| &s.unknown_fields)),
        ("mend.", config.mend.as_ref().map(|s| &s.unknown_fields)),
        ("wiz.", config.wiz.as_ref().map(|s| &s.unknown_fields)),
        ("storage.", config.storage.as_ref().map(|s| &s.unknown_fields)),
        ("merge.", config.merge.as_ref().map(|s| &s.unknown_fields)),
        ("clickhouse.", config.clickhouse.as_ref().map(|s| &s.unknown_fields)),
    ];
    for (prefix, fields) in sections {
        for key in fields.into_iter().flat_map(|f| f.keys()) {
            eprintln!(
                "⚠️  Warning: Unknown config field '{}{}' will be ignored.",
                prefix, key
            );
        }
    }
}

fn parse_provider_name(name: &str) -> Result<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "github" => Ok("github"),
        "mend" => Ok("mend"),
        "wiz" => Ok("wiz"),
        _ => Err(invalid(format!(
            "Unknown provider '{}'. Please specify 'github', 'mend' or 'wiz'",
            name
        ))),
    }
}

fn invalid(message: impl Into<String>) -> anyhow::Error {
    PipelineError::Validation {
        message: message.into(),
    }
    .into()
}

/// Looks up a value from configuration, then the environment
struct Resolver<'a> {
    env: &'a dyn Fn(&str) -> Option<String>,
}

impl Resolver<'_> {
    fn optional(&self, value: &Option<String>, env_var: Option<&str>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| env_var.and_then(|name| (self.env)(name)))
            .filter(|v| !v.trim().is_empty())
    }

    fn required(&self, value: &Option<String>, field: &str, env_var: Option<&str>) -> Result<String> {
        self.optional(value, env_var).ok_or_else(|| {
            let hint = match env_var {
                Some(name) => format!(" (or set the {} environment variable)", name),
                None => String::new(),
            };
            invalid(format!("Missing required setting '{}'{}", field, hint))
        })
    }
}

impl PipelineConfig {
    /// Builds the run configuration from the file, CLI overrides and process environment
    pub fn from_sources(file: ConfigFile, overrides: &ConfigOverrides, base_dir: &Path) -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok();
        Self::build(file, overrides, base_dir, &env)
    }

    /// Builds the run configuration with an explicit environment lookup
    ///
    /// # Errors
    /// `Validation` for missing or inconsistent settings; read or parse
    /// errors for the license mapping file
    pub fn build(
        file: ConfigFile,
        overrides: &ConfigOverrides,
        base_dir: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let resolver = Resolver { env };
        let request_timeout =
            Duration::from_secs(file.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS));

        let merge_section = file.merge.unwrap_or_default();
        let merge = overrides.merge || merge_section.enabled.unwrap_or(false);

        let provider_name = overrides.provider.as_ref().or(file.provider.as_ref());
        let provider = match provider_name {
            Some(name) => Some(match parse_provider_name(name)? {
                "github" => ProviderSettings::GitHub(github_settings(
                    file.github.unwrap_or_default(),
                    &resolver,
                    request_timeout,
                )?),
                "mend" => ProviderSettings::Mend(mend_settings(
                    file.mend.unwrap_or_default(),
                    &resolver,
                    request_timeout,
                )?),
                _ => ProviderSettings::Wiz(wiz_settings(
                    file.wiz.unwrap_or_default(),
                    &resolver,
                    request_timeout,
                )?),
            }),
            None if merge => None,
            None => {
                return Err(invalid(
                    "No provider configured. Set 'provider' in the config file or pass --provider, \
                     or enable merge mode with --merge",
                ))
            }
        };

        let storage = file.storage.ok_or_else(|| {
            invalid("Missing 'storage' section: configure 'storage.bucket' or 'storage.local_dir'")
        })?;
        let object_store = object_store_settings(&storage, &resolver, base_dir, request_timeout)?;

        let clickhouse = file
            .clickhouse
            .as_ref()
            .map(|section| clickhouse_settings(section, &resolver, request_timeout))
            .transpose()?;

        let output_dialect = match (overrides.output_format, file.output_format.as_deref()) {
            (Some(dialect), _) => dialect,
            (None, Some(raw)) => Dialect::from_str(raw).map_err(invalid)?,
            (None, None) => Dialect::CycloneDx,
        };

        let include_patterns = match &overrides.include {
            Some(raw) => CandidateFilter::split_patterns(raw),
            None => merge_section.include.unwrap_or_default(),
        };
        let exclude_patterns = match &overrides.exclude {
            Some(raw) => CandidateFilter::split_patterns(raw),
            None => merge_section.exclude.unwrap_or_default(),
        };
        // Fail fast on bad patterns rather than after the download step
        CandidateFilter::new(&include_patterns, &exclude_patterns)?;

        let license_mapping = match &file.license_mapping {
            Some(path) => load_license_mapping(&resolve_relative(base_dir, path))?,
            None => HashMap::new(),
        };

        let table = file.clickhouse.as_ref().and_then(|c| c.table.clone());
        let truncate = overrides.truncate
            || file
                .clickhouse
                .as_ref()
                .and_then(|c| c.truncate)
                .unwrap_or(false);

        Ok(Self {
            provider,
            object_store,
            clickhouse,
            converter: PathBuf::from(
                file.converter
                    .unwrap_or_else(|| DEFAULT_CONVERTER.to_string()),
            ),
            license_mapping,
            request: PipelineRequest {
                merge,
                output_dialect,
                prefix: normalize_prefix(storage.prefix.as_deref()),
                output_key: overrides.output_key.clone().or(storage.output_key),
                include_patterns,
                exclude_patterns,
                table,
                truncate,
            },
        })
    }
}

fn github_settings(
    section: GitHubSection,
    resolver: &Resolver<'_>,
    request_timeout: Duration,
) -> Result<GitHubSettings> {
    Ok(GitHubSettings {
        api_url: resolver
            .optional(&section.api_url, None)
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        owner: resolver.required(&section.owner, "github.owner", None)?,
        repo: resolver.required(&section.repo, "github.repo", None)?,
        token: resolver.required(&section.token, "github.token", Some("GITHUB_TOKEN"))?,
        retry: RetryPolicy::new(
            section.max_attempts.unwrap_or(RetryPolicy::default().max_attempts),
            Duration::from_secs(section.retry_delay_secs.unwrap_or(DEFAULT_RETRY_DELAY_SECS)),
        ),
        request_timeout,
    })
}

fn mend_settings(
    section: MendSection,
    resolver: &Resolver<'_>,
    request_timeout: Duration,
) -> Result<MendSettings> {
    let org_uuid = resolver.required(&section.org_uuid, "mend.org_uuid", None)?;
    let scope = MendScope::select(
        section.project_uuid.as_deref(),
        section.product_uuid.as_deref(),
        &org_uuid,
    );

    Ok(MendSettings {
        url: resolver.required(&section.url, "mend.url", None)?,
        email: resolver.required(&section.email, "mend.email", Some("MEND_EMAIL"))?,
        user_key: resolver.required(&section.user_key, "mend.user_key", Some("MEND_USER_KEY"))?,
        org_token: resolver.optional(&section.org_token, Some("MEND_ORG_TOKEN")),
        org_uuid,
        scope,
        poll_interval: Duration::from_secs(
            section
                .poll_interval_secs
                .unwrap_or(DEFAULT_MEND_POLL_INTERVAL_SECS),
        ),
        max_wait: Duration::from_secs(section.max_wait_secs.unwrap_or(DEFAULT_MEND_MAX_WAIT_SECS)),
        token_refresh: Duration::from_secs(
            section
                .token_refresh_secs
                .unwrap_or(DEFAULT_MEND_TOKEN_REFRESH_SECS),
        ),
        request_timeout,
    })
}

fn wiz_settings(
    section: WizSection,
    resolver: &Resolver<'_>,
    request_timeout: Duration,
) -> Result<WizSettings> {
    Ok(WizSettings {
        auth_url: resolver
            .optional(&section.auth_url, None)
            .unwrap_or_else(|| DEFAULT_WIZ_AUTH_URL.to_string()),
        api_url: resolver.required(&section.api_url, "wiz.api_url", None)?,
        client_id: resolver.required(&section.client_id, "wiz.client_id", Some("WIZ_CLIENT_ID"))?,
        client_secret: resolver.required(
            &section.client_secret,
            "wiz.client_secret",
            Some("WIZ_CLIENT_SECRET"),
        )?,
        report_id: resolver.required(&section.report_id, "wiz.report_id", None)?,
        request_timeout,
    })
}

fn object_store_settings(
    section: &StorageSection,
    resolver: &Resolver<'_>,
    base_dir: &Path,
    request_timeout: Duration,
) -> Result<ObjectStoreSettings> {
    match (&section.bucket, &section.local_dir) {
        (Some(_), Some(_)) => Err(invalid(
            "Configure either 'storage.bucket' or 'storage.local_dir', not both",
        )),
        (None, Some(root)) => Ok(ObjectStoreSettings::Local {
            root: resolve_relative(base_dir, root),
        }),
        (Some(_), None) => {
            let credentials = AwsCredentials {
                access_key_id: resolver.required(
                    &section.access_key_id,
                    "storage.access_key_id",
                    Some("AWS_ACCESS_KEY_ID"),
                )?,
                secret_access_key: resolver.required(
                    &section.secret_access_key,
                    "storage.secret_access_key",
                    Some("AWS_SECRET_ACCESS_KEY"),
                )?,
                session_token: resolver.optional(&section.session_token, Some("AWS_SESSION_TOKEN")),
            };
            Ok(ObjectStoreSettings::S3(S3Settings {
                bucket: resolver.required(&section.bucket, "storage.bucket", None)?,
                region: resolver
                    .optional(&section.region, Some("AWS_REGION"))
                    .unwrap_or_else(|| "us-east-1".to_string()),
                endpoint_url: resolver.optional(&section.endpoint_url, Some("AWS_ENDPOINT_URL")),
                credentials,
                request_timeout,
            }))
        }
        (None, None) => Err(invalid(
            "Missing object store: configure 'storage.bucket' or 'storage.local_dir'",
        )),
    }
}

fn clickhouse_settings(
    section: &ClickHouseSection,
    resolver: &Resolver<'_>,
    request_timeout: Duration,
) -> Result<ClickHouseSettings> {
    Ok(ClickHouseSettings {
        url: resolver.required(&section.url, "clickhouse.url", None)?,
        database: resolver
            .optional(&section.database, None)
            .unwrap_or_else(|| DEFAULT_CLICKHOUSE_DATABASE.to_string()),
        user: resolver.optional(&section.user, Some("CLICKHOUSE_USER")),
        password: resolver.optional(&section.password, Some("CLICKHOUSE_PASSWORD")),
        request_timeout,
    })
}

/// Object-store prefixes are used as key prefixes, so they end with `/` unless empty
fn normalize_prefix(prefix: Option<&str>) -> String {
    match prefix.map(|p| p.trim().trim_start_matches('/')) {
        None | Some("") => String::new(),
        Some(p) if p.ends_with('/') => p.to_string(),
        Some(p) => format!("{}/", p),
    }
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Loads the component-name to license mapping from a YAML or JSON file
pub fn load_license_mapping(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read license mapping file: {}\n\n💡 Hint: Check the 'license_mapping' path in the config file.",
            path.display()
        )
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let mapping: HashMap<String, String> = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse license mapping file: {}", path.display()))?
    } else {
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse license mapping file: {}", path.display()))?
    };

    Ok(mapping)
}
