use super::component::Component;
use super::sbom_metadata::SbomMetadata;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// CycloneDX `bomFormat` marker
pub const CYCLONEDX_BOM_FORMAT: &str = "CycloneDX";

/// Spec version written on merged documents
pub const MERGED_SPEC_VERSION: &str = "1.6";

/// Name of the synthetic primary component of a merged document
pub const MERGED_COMPONENT_NAME: &str = "merged-sbom";

/// CycloneDxDocument aggregate - a canonical (CycloneDX JSON) SBOM document
///
/// `metadata` stays loosely typed since providers disagree on its shape
/// (tools as array vs. object, optional properties, ...). Top-level fields
/// that are not modelled are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycloneDxDocument {
    #[serde(rename = "bomFormat", default, skip_serializing_if = "Option::is_none")]
    pub bom_format: Option<String>,
    #[serde(rename = "specVersion", default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(rename = "serialNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CycloneDxDocument {
    /// Parses a document from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses a document from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a fresh merged document around the given components
    pub fn merged(metadata: &SbomMetadata, components: Vec<Component>) -> Self {
        let metadata_value = json!({
            "timestamp": metadata.timestamp(),
            "tools": {
                "components": [{
                    "type": "application",
                    "name": metadata.tool_name(),
                    "version": metadata.tool_version(),
                }]
            },
            "component": {
                "type": "application",
                "bom-ref": MERGED_COMPONENT_NAME,
                "name": MERGED_COMPONENT_NAME,
                "version": metadata.timestamp(),
            }
        });

        Self {
            bom_format: Some(CYCLONEDX_BOM_FORMAT.to_string()),
            spec_version: Some(MERGED_SPEC_VERSION.to_string()),
            serial_number: Some(metadata.serial_number().to_string()),
            version: Some(1),
            metadata: Some(metadata_value),
            components,
            extra: Map::new(),
        }
    }

    pub fn has_cyclonedx_marker(&self) -> bool {
        self.bom_format.as_deref() == Some(CYCLONEDX_BOM_FORMAT)
    }

    /// `metadata.name`, a name declared at document level by some producers
    pub fn declared_name(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("name")?.as_str()
    }

    /// `metadata.component`, the scanned subject
    pub fn primary_component(&self) -> Option<&Value> {
        self.metadata.as_ref()?.get("component")
    }

    pub fn primary_component_name(&self) -> Option<&str> {
        self.primary_component()?.get("name")?.as_str()
    }

    /// `bom-ref` of the primary component, falling back to its purl
    pub fn primary_component_ref(&self) -> Option<&str> {
        let component = self.primary_component()?;
        component
            .get("bom-ref")
            .and_then(Value::as_str)
            .or_else(|| component.get("purl").and_then(Value::as_str))
    }

    /// Top-level `name`, present on documents converted from SPDX
    pub fn document_name(&self) -> Option<&str> {
        self.extra.get("name")?.as_str()
    }

    /// Names of the tools listed in `metadata.tools`
    ///
    /// Handles both the legacy array form and the CycloneDX 1.5
    /// `{"components": [...], "services": [...]}` form.
    pub fn tool_names(&self) -> Vec<&str> {
        let Some(tools) = self.metadata.as_ref().and_then(|m| m.get("tools")) else {
            return Vec::new();
        };

        let entries: Vec<&Value> = match tools {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => ["components", "services"]
                .iter()
                .filter_map(|k| map.get(*k).and_then(Value::as_array))
                .flatten()
                .collect(),
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter_map(|tool| tool.get("name").and_then(Value::as_str))
            .collect()
    }
}
