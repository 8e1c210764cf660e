use super::source_reference::{deserialize_optional_source, SourceReference, UNKNOWN_VALUE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Component entity - a single entry of a CycloneDX `components` list
///
/// Only the fields the pipeline reasons about are typed. Everything else
/// (hashes, externalReferences, supplier, ...) is kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Value>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_source"
    )]
    pub source: Option<SourceReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            component_type: Some("library".to_string()),
            name: Some(name.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = Some(purl.into());
        self
    }

    pub fn with_source(mut self, source: SourceReference) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_license_id(mut self, id: impl Into<String>) -> Self {
        self.licenses = Some(vec![serde_json::json!({ "license": { "id": id.into() } })]);
        self
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties
            .get_or_insert_with(Vec::new)
            .push(serde_json::json!({ "name": name, "value": value }));
        self
    }

    pub fn name_or_unknown(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(UNKNOWN_VALUE)
    }

    pub fn version_or_unknown(&self) -> &str {
        non_blank(self.version.as_deref()).unwrap_or(UNKNOWN_VALUE)
    }

    /// Returns the value of the first property with the given name
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.as_ref()?.iter().find_map(|property| {
            if property.get("name").and_then(Value::as_str) == Some(name) {
                property.get("value").and_then(Value::as_str)
            } else {
                None
            }
        })
    }

    /// Returns the license carried by the first entry of the `licenses` list
    ///
    /// Accepts `license.id`, `license.name` and `expression` entries, in that
    /// order. Blank values count as absent.
    pub fn first_license(&self) -> Option<&str> {
        let first = self.licenses.as_ref()?.first()?;
        let license = first.get("license");
        non_blank(license.and_then(|l| l.get("id")).and_then(Value::as_str))
            .or_else(|| non_blank(license.and_then(|l| l.get("name")).and_then(Value::as_str)))
            .or_else(|| non_blank(first.get("expression").and_then(Value::as_str)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
