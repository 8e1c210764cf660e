use serde_json::Value;

/// Field under which providers nest the actual SBOM
const ENVELOPE_FIELD: &str = "sbom";

/// EnvelopeResolver service for stripping provider envelopes
///
/// GitHub returns `{"sbom": {...}}`; other providers return the document
/// directly.
pub struct EnvelopeResolver;

impl EnvelopeResolver {
    /// Returns the document nested under `sbom`, or the input unchanged
    ///
    /// Nested envelopes are peeled until the top level no longer has an
    /// `sbom` object, so applying this twice gives the same result as once.
    pub fn unwrap(document: Value) -> Value {
        let mut current = document;
        loop {
            match current {
                Value::Object(mut map) if map.get(ENVELOPE_FIELD).is_some_and(Value::is_object) => {
                    // Checked above
                    current = map.remove(ENVELOPE_FIELD).unwrap_or(Value::Null);
                }
                other => return other,
            }
        }
    }

    /// Whether the document carries an envelope
    pub fn is_wrapped(document: &Value) -> bool {
        document
            .get(ENVELOPE_FIELD)
            .is_some_and(Value::is_object)
    }
}
