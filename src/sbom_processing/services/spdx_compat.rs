use serde_json::Value;

const REFERENCE_CATEGORY_FIELD: &str = "referenceCategory";

/// Reference categories accepted by SPDX 2.2
const LEGAL_CATEGORIES: [&str; 4] = ["SECURITY", "PACKAGE_MANAGER", "PERSISTENT_ID", "OTHER"];

/// SpdxCompatibilityPatch service for repairing `referenceCategory` values
///
/// Newer SPDX producers emit categories (or the legacy `PACKAGE-MANAGER`
/// spelling) that SPDX 2.2 converters reject.
pub struct SpdxCompatibilityPatch;

impl SpdxCompatibilityPatch {
    /// Rewrites every `referenceCategory` in the document, at any depth
    ///
    /// # Returns
    /// The number of values that were changed
    pub fn apply(document: &mut Value) -> usize {
        match document {
            Value::Object(map) => {
                let mut changed = 0;
                if let Some(category) = map.get_mut(REFERENCE_CATEGORY_FIELD) {
                    let normalized = Self::normalize_category(category.as_str());
                    if category.as_str() != Some(normalized) {
                        *category = Value::String(normalized.to_string());
                        changed += 1;
                    }
                }
                for (key, value) in map.iter_mut() {
                    if key != REFERENCE_CATEGORY_FIELD {
                        changed += Self::apply(value);
                    }
                }
                changed
            }
            Value::Array(items) => items.iter_mut().map(Self::apply).sum(),
            _ => 0,
        }
    }

    /// Maps a category onto one of the four SPDX 2.2 values
    pub fn normalize_category(category: Option<&str>) -> &'static str {
        match category {
            Some("PACKAGE-MANAGER") => "PACKAGE_MANAGER",
            Some(value) => LEGAL_CATEGORIES
                .iter()
                .find(|legal| **legal == value)
                .copied()
                .unwrap_or("OTHER"),
            None => "OTHER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_category() {
        assert_eq!(SpdxCompatibilityPatch::normalize_category(Some("SECURITY")), "SECURITY");
        assert_eq!(
            SpdxCompatibilityPatch::normalize_category(Some("PACKAGE-MANAGER")),
            "PACKAGE_MANAGER"
        );
        assert_eq!(
            SpdxCompatibilityPatch::normalize_category(Some("PACKAGE_MANAGER")),
            "PACKAGE_MANAGER"
        );
        assert_eq!(
            SpdxCompatibilityPatch::normalize_category(Some("PERSISTENT-ID")),
            "OTHER"
        );
        assert_eq!(SpdxCompatibilityPatch::normalize_category(None), "OTHER");
    }

    #[test]
    fn test_apply_rewrites_nested_references() {
        let mut document = json!({
            "spdxVersion": "SPDX-2.3",
            "packages": [
                {
                    "name": "lodash",
                    "externalRefs": [
                        {"referenceCategory": "PACKAGE-MANAGER", "referenceType": "purl"},
                        {"referenceCategory": "SECURITY", "referenceType": "cpe23Type"},
                        {"referenceCategory": "PERSISTENT-ID", "referenceType": "gitoid"}
                    ]
                }
            ]
        });

        let changed = SpdxCompatibilityPatch::apply(&mut document);

        assert_eq!(changed, 2);
        let refs = &document["packages"][0]["externalRefs"];
        assert_eq!(refs[0]["referenceCategory"], "PACKAGE_MANAGER");
        assert_eq!(refs[1]["referenceCategory"], "SECURITY");
        assert_eq!(refs[2]["referenceCategory"], "OTHER");
    }

    #[test]
    fn test_apply_handles_non_string_category() {
        let mut document = json!({"externalRefs": [{"referenceCategory": 7}]});
        assert_eq!(SpdxCompatibilityPatch::apply(&mut document), 1);
        assert_eq!(document["externalRefs"][0]["referenceCategory"], "OTHER");
    }

    #[test]
    fn test_apply_leaves_legal_document_untouched() {
        let mut document = json!({"packages": [{"externalRefs": [{"referenceCategory": "OTHER"}]}]});
        let before = document.clone();
        assert_eq!(SpdxCompatibilityPatch::apply(&mut document), 0);
        assert_eq!(document, before);
    }
}
