use crate::sbom_processing::domain::{CycloneDxDocument, SourceReference};

/// Tool names that say nothing about the scanned target
const GENERIC_TOOL_NAMES: &[&str] = &[
    "cyclonedx",
    "syft",
    "trivy",
    "cdxgen",
    "sbom",
    "merged-sbom",
    "github.com-dependency-graph",
    "mend",
    "wiz",
];

/// SourceInference service for naming the target a document describes
///
/// Tries, in order, the first non-blank of:
/// 1. `metadata.name`
/// 2. `metadata.component.name`
/// 3. `metadata.component["bom-ref"]`, then `metadata.component.purl`
/// 4. top-level `name`
/// 5. the first tool name that is not a generic SBOM tool
/// 6. the caller-supplied fallback (usually the file stem)
/// 7. `"unknown"`
pub struct SourceInference;

impl SourceInference {
    pub fn infer(document: &CycloneDxDocument, fallback: Option<&str>) -> SourceReference {
        document
            .declared_name()
            .and_then(SourceReference::new)
            .or_else(|| document.primary_component_name().and_then(SourceReference::new))
            .or_else(|| document.primary_component_ref().and_then(SourceReference::new))
            .or_else(|| document.document_name().and_then(SourceReference::new))
            .or_else(|| Self::tool_hint(document))
            .or_else(|| fallback.and_then(SourceReference::new))
            .unwrap_or_else(SourceReference::unknown)
    }

    /// Whether a tool name identifies only the SBOM generator
    pub fn is_generic_tool_name(name: &str) -> bool {
        let lowered = name.trim().to_lowercase();
        GENERIC_TOOL_NAMES.iter().any(|generic| *generic == lowered)
    }

    fn tool_hint(document: &CycloneDxDocument) -> Option<SourceReference> {
        document
            .tool_names()
            .into_iter()
            .filter(|name| !Self::is_generic_tool_name(name))
            .find_map(SourceReference::new)
    }
}
