use crate::sbom_processing::domain::SbomMetadata;
use chrono::Utc;
use uuid::Uuid;

/// Name written into the tool metadata of produced documents
pub const TOOL_NAME: &str = "sbom-collector";

/// SbomGenerator service for generating SBOM identity metadata
///
/// Each call produces a fresh timestamp and serial number.
pub struct SbomGenerator;

impl SbomGenerator {
    /// Generates SBOM metadata with current timestamp and unique serial number
    ///
    /// # Arguments
    /// * `tool_name` - Name of the tool generating the SBOM
    /// * `tool_version` - Version of the tool
    ///
    /// # Returns
    /// SbomMetadata with an RFC 3339 UTC timestamp and a `urn:uuid:` serial number
    pub fn generate_metadata(tool_name: &str, tool_version: &str) -> SbomMetadata {
        let timestamp = Utc::now().to_rfc3339();
        let serial_number = format!("urn:uuid:{}", Uuid::new_v4());

        SbomMetadata::new(
            timestamp,
            tool_name.to_string(),
            tool_version.to_string(),
            serial_number,
        )
    }

    /// Generates SBOM metadata naming this crate and its compile-time version
    pub fn generate_default_metadata() -> SbomMetadata {
        Self::generate_metadata(TOOL_NAME, env!("CARGO_PKG_VERSION"))
    }
}
