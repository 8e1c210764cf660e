use crate::sbom_processing::domain::{Dialect, CYCLONEDX_BOM_FORMAT};
use serde_json::Value;

/// FormatDetector service for classifying SBOM documents
pub struct FormatDetector;

impl FormatDetector {
    /// Detects the dialect of a parsed document
    ///
    /// Checks, in order:
    /// 1. `bomFormat == "CycloneDX"`
    /// 2. presence of `metadata.component` (CycloneDX without the marker)
    /// 3. `spdxVersion` or `SPDXID` (SPDX)
    ///
    /// Anything else is `Unknown`.
    pub fn detect(document: &Value) -> Dialect {
        if document.get("bomFormat").and_then(Value::as_str) == Some(CYCLONEDX_BOM_FORMAT) {
            return Dialect::CycloneDx;
        }

        if Self::has_primary_component(document) {
            return Dialect::CycloneDx;
        }

        if document.get("spdxVersion").is_some() || document.get("SPDXID").is_some() {
            return Dialect::Spdx;
        }

        Dialect::Unknown
    }

    /// CycloneDX-shape probe used to accept bulk-merge candidates
    pub fn is_cyclonedx_shape(document: &Value) -> bool {
        Self::detect(document) == Dialect::CycloneDx
    }

    fn has_primary_component(document: &Value) -> bool {
        document
            .get("metadata")
            .and_then(|m| m.get("component"))
            .is_some_and(|c| !c.is_null())
    }
}
