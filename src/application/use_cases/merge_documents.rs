use super::normalize_document::NormalizeDocumentUseCase;
use crate::application::run_context::RunContext;
use crate::ports::outbound::{ObjectStore, ObjectSummary, ProgressReporter};
use crate::sbom_processing::domain::CycloneDxDocument;
use crate::sbom_processing::services::{
    CandidateFilter, EnvelopeResolver, FormatDetector, MergeEngine, MergeInput, MergeOutcome,
};
use crate::shared::error::{PipelineError, RejectedCandidate};
use crate::shared::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Selection of stored objects for a bulk merge
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub prefix: String,
    /// Key the merged document will be written to; never merged into itself
    pub output_key: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

/// Merge result for a store-backed run
#[derive(Debug, Clone)]
pub struct StoreMerge {
    pub outcome: MergeOutcome,
    pub merged_keys: Vec<String>,
    pub rejected: Vec<RejectedCandidate>,
}

/// MergeDocumentsUseCase - the two entry points into the merge engine
///
/// `merge_from_store` combines documents already in the object store;
/// `merge_local` combines the members of a multi-document provider archive.
pub struct MergeDocumentsUseCase {
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl MergeDocumentsUseCase {
    pub fn new(progress_reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { progress_reporter }
    }

    /// Merges every eligible CycloneDX object under `options.prefix`
    ///
    /// # Errors
    /// `EmptyCandidateSet` with every rejected key when nothing is mergeable;
    /// object-store failures abort the run
    pub async fn merge_from_store(
        &self,
        store: &dyn ObjectStore,
        options: &MergeOptions,
    ) -> Result<StoreMerge> {
        let location = store.location(&options.prefix);
        self.progress_reporter
            .report(&format!("🔍 Listing stored SBOMs under {}", location));

        let objects = store.list_objects(&options.prefix).await?;
        let filter = CandidateFilter::new(&options.include_patterns, &options.exclude_patterns)?;
        let (candidates, mut rejected) = Self::select_candidates(objects, options, &filter);

        for pattern in filter.get_unmatched_patterns() {
            self.progress_reporter.report_error(&format!(
                "⚠️  Warning: Pattern '{}' did not match any stored object",
                pattern
            ));
        }

        self.progress_reporter.report(&format!(
            "📥 Downloading {} candidate document(s)...",
            candidates.len()
        ));

        let mut inputs = Vec::new();
        let mut merged_keys = Vec::new();
        let total = candidates.len();
        for (index, key) in candidates.into_iter().enumerate() {
            self.progress_reporter
                .report_progress(index + 1, total, Some(&key));

            let bytes = store.get_object(&key).await?;
            match Self::parse_candidate(&bytes) {
                Ok(document) => {
                    inputs.push(MergeInput::new(document, fallback_name(&key)));
                    merged_keys.push(key);
                }
                Err(reason) => rejected.push(RejectedCandidate::new(key, reason)),
            }
        }
        if total > 0 {
            self.progress_reporter
                .report_completion("✅ Downloads complete");
        }

        if inputs.is_empty() {
            return Err(PipelineError::EmptyCandidateSet { location, rejected }.into());
        }

        for candidate in &rejected {
            self.progress_reporter.report_error(&format!(
                "⚠️  Skipping {}: {}",
                candidate.key, candidate.reason
            ));
        }

        let outcome = self.merge(inputs)?;
        Ok(StoreMerge {
            outcome,
            merged_keys,
            rejected,
        })
    }

    /// Merges resident files, normalizing each to CycloneDX first
    pub async fn merge_local(
        &self,
        normalizer: &NormalizeDocumentUseCase,
        paths: &[PathBuf],
        context: &RunContext,
    ) -> Result<MergeOutcome> {
        self.progress_reporter
            .report(&format!("🧩 Merging {} document(s) from the archive...", paths.len()));

        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            let canonical = normalizer.to_cyclonedx(path, context).await?;
            let document = NormalizeDocumentUseCase::load_canonical(&canonical)?;
            inputs.push(MergeInput::new(document, file_stem(path)));
        }

        self.merge(inputs)
    }

    fn merge(&self, inputs: Vec<MergeInput>) -> Result<MergeOutcome> {
        let document_count = inputs.len();
        let outcome = MergeEngine::merge_documents(inputs)?;

        self.progress_reporter.report(&format!(
            "✅ Merged {} document(s): {} component(s), {} duplicate(s) removed",
            document_count,
            outcome.document.components.len(),
            outcome.duplicates_removed
        ));

        Ok(outcome)
    }

    /// Splits a listing into keys to download and keys rejected by name
    fn select_candidates(
        objects: Vec<ObjectSummary>,
        options: &MergeOptions,
        filter: &CandidateFilter,
    ) -> (Vec<String>, Vec<RejectedCandidate>) {
        let mut candidates = Vec::new();
        let mut rejected = Vec::new();

        for object in objects {
            if object.key == options.output_key || !object.key.ends_with(".json") {
                continue;
            }
            if filter.accepts(&object.key) {
                candidates.push(object.key);
            } else {
                rejected.push(RejectedCandidate::new(
                    object.key,
                    "excluded by include/exclude patterns",
                ));
            }
        }

        (candidates, rejected)
    }

    /// Parses a downloaded object, returning the rejection reason on failure
    fn parse_candidate(bytes: &[u8]) -> std::result::Result<CycloneDxDocument, String> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;
        let value = EnvelopeResolver::unwrap(value);

        if !FormatDetector::is_cyclonedx_shape(&value) {
            return Err(format!(
                "detected format: {}",
                FormatDetector::detect(&value)
            ));
        }

        CycloneDxDocument::from_value(value)
            .map_err(|e| format!("not a usable CycloneDX document: {}", e))
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// File name of an object key without its `.json` extension
fn fallback_name(key: &str) -> Option<String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    let stem = name.strip_suffix(".json").unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_string())
}
