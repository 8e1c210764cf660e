use crate::shared::Result;
use std::time::Duration;

/// Time allowed to establish a connection, independent of the request timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall timeout for a single request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// User agent sent on every request, e.g. `sbom-collector/0.4.0`
pub fn user_agent() -> String {
    format!("sbom-collector/{}", env!("CARGO_PKG_VERSION"))
}

/// Builds the HTTP client shared by the network adapters
///
/// # Arguments
/// * `request_timeout` - Overall timeout for one request, including the body
pub fn build_http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .user_agent(user_agent())
        .build()?;
    Ok(client)
}

/// Returns at most `limit` characters of a response body for diagnostics
pub fn truncate_body(body: &str, limit: usize) -> String {
    let mut truncated: String = body.chars().take(limit).collect();
    if body.chars().count() > limit {
        truncated.push_str("...");
    }
    truncated
}
