use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel used for absent names, versions, licenses and sources
pub const UNKNOWN_VALUE: &str = "unknown";

/// NewType wrapper for a component's source reference
///
/// Identifies which scanned target (repository, project, report, ...) a
/// component came from. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceReference(String);

impl SourceReference {
    /// Creates a source reference, trimming whitespace.
    ///
    /// Returns `None` for blank input so callers can fall through to the
    /// next inference step.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The literal `"unknown"` source, last step of every inference chain
    pub fn unknown() -> Self {
        Self(UNKNOWN_VALUE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deserializes an optional `source` field
///
/// Null and blank strings are absent. Numbers and booleans keep their
/// textual form; objects and arrays are kept as compact JSON text so the
/// original value still appears in the output.
pub(crate) fn deserialize_optional_source<'de, D>(
    deserializer: D,
) -> Result<Option<SourceReference>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => SourceReference::new(text),
        Some(other) => SourceReference::new(other.to_string()),
    })
}
