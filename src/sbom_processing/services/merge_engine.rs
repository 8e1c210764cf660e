use super::component_deduplicator::ComponentDeduplicator;
use super::sbom_generator::SbomGenerator;
use super::source_inference::SourceInference;
use crate::sbom_processing::domain::{
    CycloneDxDocument, SbomMetadata, SourceReference, CYCLONEDX_BOM_FORMAT,
};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use serde_json::Value;

/// One document handed to the merge engine
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub document: CycloneDxDocument,
    /// Used when nothing in the document names its target (usually the file stem)
    pub fallback_name: Option<String>,
}

impl MergeInput {
    pub fn new(document: CycloneDxDocument, fallback_name: Option<String>) -> Self {
        Self {
            document,
            fallback_name,
        }
    }
}

/// Result of a merge run
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: CycloneDxDocument,
    /// Source inferred for each input, in input order
    pub sources: Vec<SourceReference>,
    pub input_components: usize,
    pub duplicates_removed: usize,
}

/// MergeEngine service for combining several CycloneDX documents into one
///
/// Every component of the output carries a `source`. A component that
/// already has one keeps it; the others get the source inferred for their
/// document. Duplicates (same name, version, purl and source) are dropped
/// with the first occurrence winning.
pub struct MergeEngine;

impl MergeEngine {
    /// Merges documents with freshly generated identity metadata
    pub fn merge_documents(inputs: Vec<MergeInput>) -> Result<MergeOutcome> {
        Self::merge_with_metadata(inputs, &SbomGenerator::generate_default_metadata())
    }

    /// Merges documents using the given identity metadata
    ///
    /// # Errors
    /// Returns `InvalidMergedDocument` if the assembled document does not
    /// survive a serialize/parse cycle with its CycloneDX marker intact
    pub fn merge_with_metadata(
        inputs: Vec<MergeInput>,
        metadata: &SbomMetadata,
    ) -> Result<MergeOutcome> {
        let mut sources = Vec::with_capacity(inputs.len());
        let mut flattened = Vec::new();

        for input in inputs {
            let source = SourceInference::infer(&input.document, input.fallback_name.as_deref());
            for mut component in input.document.components {
                if component.source.is_none() {
                    component.source = Some(source.clone());
                }
                flattened.push(component);
            }
            sources.push(source);
        }

        let input_components = flattened.len();
        let (components, duplicates_removed) = ComponentDeduplicator::deduplicate(flattened);
        let document = CycloneDxDocument::merged(metadata, components);

        Self::validate(&document)?;

        Ok(MergeOutcome {
            document,
            sources,
            input_components,
            duplicates_removed,
        })
    }

    /// Checks that the document serializes to JSON carrying the CycloneDX marker
    pub fn validate(document: &CycloneDxDocument) -> Result<()> {
        let serialized = document
            .to_json_pretty()
            .map_err(|e| PipelineError::InvalidMergedDocument {
                details: format!("serialization failed: {}", e),
            })?;

        let reparsed: Value =
            serde_json::from_str(&serialized).map_err(|e| PipelineError::InvalidMergedDocument {
                details: format!("output is not valid JSON: {}", e),
            })?;

        match reparsed.get("bomFormat").and_then(Value::as_str) {
            Some(CYCLONEDX_BOM_FORMAT) => Ok(()),
            other => Err(PipelineError::InvalidMergedDocument {
                details: format!(
                    "expected bomFormat '{}', found {:?}",
                    CYCLONEDX_BOM_FORMAT, other
                ),
            }
            .into()),
        }
    }
}
