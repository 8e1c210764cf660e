/// Use cases module containing application business logic orchestration
mod convert_document;
mod merge_documents;
mod normalize_document;
mod project_to_sink;
mod run_pipeline;

#[cfg(test)]
pub(crate) mod test_doubles;

pub use convert_document::DocumentConverter;
pub use merge_documents::{MergeDocumentsUseCase, MergeOptions, StoreMerge};
pub use normalize_document::NormalizeDocumentUseCase;
pub use project_to_sink::{ProjectToSinkUseCase, ProjectionReport, SchemaChange};
pub use run_pipeline::RunPipelineUseCase;
