use super::convert_document::DocumentConverter;
use super::merge_documents::{MergeDocumentsUseCase, MergeOptions};
use super::normalize_document::NormalizeDocumentUseCase;
use super::project_to_sink::ProjectToSinkUseCase;
use crate::adapters::outbound::filesystem::document_files;
use crate::application::dto::{PipelineRequest, PipelineResponse};
use crate::application::run_context::RunContext;
use crate::ports::outbound::{
    AnalyticalSink, FetchOutcome, FormatConverter, ObjectMetadata, ObjectStore, ProgressReporter,
    SbomProvider,
};
use crate::sbom_processing::domain::{
    CycloneDxDocument, Dialect, SourceReference, TableName, MERGED_COMPONENT_NAME,
};
use crate::sbom_processing::services::LicenseMapper;
use crate::shared::error::{PipelineError, RejectedCandidate};
use crate::shared::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider name used for tables derived in merge mode
const MERGE_TABLE_PROVIDER: &str = "merged";

/// Canonical document produced by either mode, ready for upload and projection
struct CanonicalDocument {
    path: PathBuf,
    document: CycloneDxDocument,
    default_source: SourceReference,
    table: TableName,
    output_key: String,
    rejected: Vec<RejectedCandidate>,
}

/// RunPipelineUseCase - one end-to-end acquisition run
///
/// Single mode fetches from the configured provider; merge mode combines
/// documents already in the object store. Both end with the canonical
/// document uploaded and, when a sink is configured, projected into it.
pub struct RunPipelineUseCase {
    provider: Option<Arc<dyn SbomProvider>>,
    object_store: Arc<dyn ObjectStore>,
    normalizer: NormalizeDocumentUseCase,
    merger: MergeDocumentsUseCase,
    projector: Option<ProjectToSinkUseCase>,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl RunPipelineUseCase {
    pub fn new(
        provider: Option<Arc<dyn SbomProvider>>,
        object_store: Arc<dyn ObjectStore>,
        converter: Arc<dyn FormatConverter>,
        sink: Option<Arc<dyn AnalyticalSink>>,
        license_mapper: LicenseMapper,
        progress_reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            provider,
            object_store,
            normalizer: NormalizeDocumentUseCase::new(
                DocumentConverter::new(converter),
                progress_reporter.clone(),
            ),
            merger: MergeDocumentsUseCase::new(progress_reporter.clone()),
            projector: sink.map(|sink| {
                ProjectToSinkUseCase::new(sink, license_mapper, progress_reporter.clone())
            }),
            progress_reporter,
        }
    }

    /// Executes the pipeline
    ///
    /// All intermediate files live in a run context removed when this
    /// returns, whatever the outcome.
    pub async fn execute(&self, request: PipelineRequest) -> Result<PipelineResponse> {
        let context = RunContext::new()?;

        // Step 1: Produce the canonical document
        let canonical = if request.merge {
            self.merge_stored(&request, &context).await?
        } else {
            self.fetch_and_normalize(&request, &context).await?
        };

        // Step 2: Upload in the requested dialect
        let output_location = self.upload(&canonical, &request, &context).await?;

        // Step 3: Project into the sink
        let rows_written = self.project_if_configured(&canonical, &request).await?;

        self.progress_reporter
            .report_completion("✅ Pipeline run completed");

        Ok(PipelineResponse {
            output_location,
            component_count: canonical.document.components.len(),
            rows_written,
            rejected_candidates: canonical.rejected,
        })
    }

    async fn fetch_and_normalize(
        &self,
        request: &PipelineRequest,
        context: &RunContext,
    ) -> Result<CanonicalDocument> {
        let provider = self.provider.as_ref().ok_or_else(|| PipelineError::Validation {
            message: "A provider is required unless merge mode is enabled".to_string(),
        })?;

        self.progress_reporter.report(&format!(
            "📡 Fetching SBOM from {} for {}...",
            provider.name(),
            provider.default_source()
        ));

        let raw = context.file("fetched.json");
        let (path, document) = match provider.fetch(&raw).await? {
            FetchOutcome::Single(path) => {
                let canonical = self.normalizer.to_cyclonedx(&path, context).await?;
                let document = NormalizeDocumentUseCase::load_canonical(&canonical)?;
                (canonical, document)
            }
            FetchOutcome::Multiple(paths) => {
                let outcome = self
                    .merger
                    .merge_local(&self.normalizer, &paths, context)
                    .await?;
                let merged = context.file("merged.cdx.json");
                document_files::write_bytes(&merged, outcome.document.to_json_pretty()?.as_bytes())?;
                (merged, outcome.document)
            }
        };

        let identifier = provider.table_identifier();
        let table = match &request.table {
            Some(explicit) => TableName::new(explicit)?,
            None => TableName::derive(provider.name(), &identifier)?,
        };

        Ok(CanonicalDocument {
            path,
            document,
            default_source: SourceReference::new(provider.default_source())
                .unwrap_or_else(SourceReference::unknown),
            table,
            output_key: request
                .output_key
                .clone()
                .unwrap_or_else(|| format!("{}{}.json", request.prefix, identifier)),
            rejected: Vec::new(),
        })
    }

    async fn merge_stored(
        &self,
        request: &PipelineRequest,
        context: &RunContext,
    ) -> Result<CanonicalDocument> {
        let output_key = request
            .output_key
            .clone()
            .unwrap_or_else(|| format!("{}{}.json", request.prefix, MERGED_COMPONENT_NAME));

        let options = MergeOptions {
            prefix: request.prefix.clone(),
            output_key: output_key.clone(),
            include_patterns: request.include_patterns.clone(),
            exclude_patterns: request.exclude_patterns.clone(),
        };
        let merge = self
            .merger
            .merge_from_store(self.object_store.as_ref(), &options)
            .await?;

        let path = context.file("merged.cdx.json");
        document_files::write_bytes(&path, merge.outcome.document.to_json_pretty()?.as_bytes())?;

        let table = match &request.table {
            Some(explicit) => TableName::new(explicit)?,
            None => TableName::derive(MERGE_TABLE_PROVIDER, merge_identifier(&request.prefix))?,
        };

        Ok(CanonicalDocument {
            path,
            document: merge.outcome.document,
            default_source: SourceReference::unknown(),
            table,
            output_key,
            rejected: merge.rejected,
        })
    }

    async fn upload(
        &self,
        canonical: &CanonicalDocument,
        request: &PipelineRequest,
        context: &RunContext,
    ) -> Result<String> {
        let output = self
            .normalizer
            .to_dialect(&canonical.path, request.output_dialect, context)
            .await?;
        let body = document_files::read_bytes(&output)?;

        let source = if request.merge {
            MERGED_COMPONENT_NAME.to_string()
        } else {
            canonical.default_source.to_string()
        };
        let metadata = ObjectMetadata::new(format_tag(request.output_dialect), source);

        let location = self.object_store.location(&canonical.output_key);
        self.progress_reporter
            .report(&format!("📤 Uploading {} document to {}", request.output_dialect, location));
        self.object_store
            .put_object(&canonical.output_key, body, &metadata)
            .await?;

        Ok(location)
    }

    async fn project_if_configured(
        &self,
        canonical: &CanonicalDocument,
        request: &PipelineRequest,
    ) -> Result<Option<usize>> {
        let Some(projector) = &self.projector else {
            self.progress_reporter
                .report("ℹ️  No analytical sink configured, skipping projection");
            return Ok(None);
        };

        let report = projector
            .execute(
                &canonical.document,
                &canonical.table,
                &canonical.default_source,
                request.truncate,
            )
            .await?;

        Ok(Some(report.rows_written))
    }
}

/// Value of the `format` object metadata tag
fn format_tag(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Spdx => "spdx",
        _ => "cyclonedx",
    }
}

/// Target identifier for merge-mode tables: the prefix, or `all` without one
fn merge_identifier(prefix: &str) -> &str {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "all"
    } else {
        trimmed
    }
}
