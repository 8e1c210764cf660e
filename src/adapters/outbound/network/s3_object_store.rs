use super::http_client::{build_http_client, truncate_body};
use crate::ports::outbound::{ObjectMetadata, ObjectStore, ObjectSummary};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Bucket location and credentials for an S3-compatible store
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO, LocalStack, etc.
    pub endpoint_url: Option<String>,
    pub credentials: AwsCredentials,
    pub request_timeout: Duration,
}

/// AWS credentials, from configuration or the standard environment variables
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl AwsCredentials {
    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// and optionally `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

/// A request ready to send: URL plus the headers that must accompany it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// S3ObjectStore adapter speaking the S3 REST API with SigV4 signing
pub struct S3ObjectStore {
    client: reqwest::Client,
    settings: S3Settings,
}

impl S3ObjectStore {
    pub fn new(settings: S3Settings) -> Result<Self> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self { client, settings })
    }

    fn failure(&self, key: &str, details: String) -> anyhow::Error {
        PipelineError::ObjectStoreFailure {
            location: self.location(key),
            details,
        }
        .into()
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<(Vec<ObjectSummary>, Option<String>)> {
        let mut query = vec![
            ("list-type".to_string(), "2".to_string()),
            ("max-keys".to_string(), "1000".to_string()),
        ];
        if !prefix.is_empty() {
            query.push(("prefix".to_string(), prefix.to_string()));
        }
        if let Some(token) = continuation_token {
            query.push(("continuation-token".to_string(), token.to_string()));
        }

        let signed = sign_request(&self.settings, "GET", "", &query, &[], b"", Utc::now());
        let mut request = self.client.get(&signed.url);
        for (name, value) in &signed.headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(prefix, format!("ListObjectsV2 request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.failure(prefix, e.to_string()))?;
        if !status.is_success() {
            return Err(self.failure(
                prefix,
                format!("ListObjectsV2 failed (HTTP {}): {}", status, truncate_body(&body, 500)),
            ));
        }

        let (objects, is_truncated, next_token) = parse_list_objects_response(&body);
        Ok((objects, if is_truncated { next_token } else { None }))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, metadata: &ObjectMetadata) -> Result<()> {
        let extra_headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("x-amz-meta-format".to_string(), metadata.format.clone()),
            ("x-amz-meta-source".to_string(), ascii_header_value(&metadata.source)),
        ];
        let signed = sign_request(&self.settings, "PUT", key, &[], &extra_headers, &body, Utc::now());

        let mut request = self.client.put(&signed.url);
        for (name, value) in &signed.headers {
            request = request.header(name, value);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| self.failure(key, format!("PutObject request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(
                key,
                format!("PutObject failed (HTTP {}): {}", status, truncate_body(&body, 500)),
            ));
        }

        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let (batch, next) = self.list_page(prefix, continuation_token.as_deref()).await?;
            objects.extend(batch);
            match next {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let signed = sign_request(&self.settings, "GET", key, &[], &[], b"", Utc::now());
        let mut request = self.client.get(&signed.url);
        for (name, value) in &signed.headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(key, format!("GetObject request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failure(key, format!("GetObject failed (HTTP {})", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.failure(key, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.settings.bucket, key)
    }
}

// ============ AWS SigV4 ============

/// Signs an S3 request with AWS Signature Version 4
///
/// With a custom endpoint the bucket goes in the path (`https://host/bucket/key`),
/// which MinIO and LocalStack expect; otherwise virtual-hosted style is used.
pub fn sign_request(
    settings: &S3Settings,
    method: &str,
    key: &str,
    query: &[(String, String)],
    extra_headers: &[(String, String)],
    payload: &[u8],
    now: DateTime<Utc>,
) -> SignedRequest {
    let (scheme, host, path_prefix) = s3_endpoint(settings);
    let encoded_key = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
    let canonical_uri = if encoded_key.is_empty() {
        format!("{}/", path_prefix)
    } else {
        format!("{}/{}", path_prefix, encoded_key)
    };

    let date_stamp = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let payload_hash = hex_sha256(payload);

    let mut sorted_query = query.to_vec();
    sorted_query.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_querystring: String = sorted_query
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut headers = vec![
        ("host".to_string(), host.clone()),
        ("x-amz-content-sha256".to_string(), payload_hash.clone()),
        ("x-amz-date".to_string(), amz_date.clone()),
    ];
    if let Some(token) = &settings.credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }
    headers.extend(
        extra_headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string())),
    );
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let signed_headers: String = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, canonical_uri, canonical_querystring, canonical_headers, signed_headers, payload_hash
    );

    let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, settings.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        credential_scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        &settings.credentials.secret_access_key,
        &date_stamp,
        &settings.region,
        "s3",
    );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        settings.credentials.access_key_id, credential_scope, signed_headers, signature
    );

    let url = if canonical_querystring.is_empty() {
        format!("{}://{}{}", scheme, host, canonical_uri)
    } else {
        format!("{}://{}{}?{}", scheme, host, canonical_uri, canonical_querystring)
    };

    // reqwest sets Host itself
    let mut request_headers: Vec<(String, String)> =
        headers.into_iter().filter(|(k, _)| k != "host").collect();
    request_headers.push(("authorization".to_string(), authorization));

    SignedRequest {
        url,
        headers: request_headers,
    }
}

/// Scheme, host and path prefix for the configured bucket
fn s3_endpoint(settings: &S3Settings) -> (String, String, String) {
    match &settings.endpoint_url {
        Some(endpoint) => {
            let scheme = if endpoint.starts_with("http://") {
                "http"
            } else {
                "https"
            };
            let host = endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string();
            (
                scheme.to_string(),
                host,
                format!("/{}", uri_encode(&settings.bucket)),
            )
        }
        None => (
            "https".to_string(),
            format!("{}.s3.{}.amazonaws.com", settings.bucket, settings.region),
            String::new(),
        ),
    }
}

/// S3 user metadata must be ASCII; other characters are percent-encoded
fn ascii_header_value(value: &str) -> String {
    if value.is_ascii() && !value.chars().any(|c| c.is_ascii_control()) {
        value.to_string()
    } else {
        urlencoding::encode(value).into_owned()
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986, leaving only `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

// ============ ListObjectsV2 XML ============

/// Parses a `ListObjectsV2` response into summaries, the truncation flag and
/// the next continuation token
pub fn parse_list_objects_response(xml: &str) -> (Vec<ObjectSummary>, bool, Option<String>) {
    let mut objects = Vec::new();
    let is_truncated = extract_xml_value(xml, "IsTruncated")
        .map(|v| v == "true")
        .unwrap_or(false);
    let next_token = extract_xml_value(xml, "NextContinuationToken");

    let mut remaining = xml;
    while let Some(start) = remaining.find("<Contents>") {
        let block_start = start + "<Contents>".len();
        let Some(end) = remaining[block_start..].find("</Contents>") else {
            break;
        };
        let block = &remaining[block_start..block_start + end];

        let key = extract_xml_value(block, "Key")
            .map(|k| unescape_xml(&k))
            .unwrap_or_default();
        if !key.is_empty() && !key.ends_with('/') {
            let size = extract_xml_value(block, "Size")
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            objects.push(ObjectSummary { key, size });
        }

        remaining = &remaining[block_start + end + "</Contents>".len()..];
    }

    (objects, is_truncated, next_token)
}

fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)?;
    Some(xml[start..start + end].to_string())
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
