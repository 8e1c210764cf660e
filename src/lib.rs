//! sbom-collector - SBOM acquisition, normalization and loading
//!
//! Fetches SBOM documents from GitHub, Mend or Wiz, normalizes them to
//! CycloneDX JSON, merges documents with per-component provenance, and
//! loads the result into an object store and a ClickHouse table.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_processing`): Document model, merge and projection logic
//! - **Application Layer** (`application`): Use cases orchestrating a pipeline run
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Provider clients, converter, object stores and sink
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use sbom_collector::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let progress_reporter: Arc<dyn ProgressReporter> = Arc::new(StderrProgressReporter::new());
//! let use_case = RunPipelineUseCase::new(
//!     None,
//!     Arc::new(LocalObjectStore::new("./sboms")),
//!     Arc::new(CycloneDxCliConverter::default()),
//!     None,
//!     LicenseMapper::default(),
//!     progress_reporter,
//! );
//!
//! let request = PipelineRequest {
//!     merge: true,
//!     ..PipelineRequest::default()
//! };
//! let response = use_case.execute(request).await?;
//! println!("{} components", response.component_count);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod ports;
pub mod sbom_processing;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::converter::CycloneDxCliConverter;
    pub use crate::adapters::outbound::filesystem::LocalObjectStore;
    pub use crate::application::dto::{PipelineRequest, PipelineResponse};
    pub use crate::application::use_cases::{MergeDocumentsUseCase, RunPipelineUseCase};
    pub use crate::ports::outbound::{
        AnalyticalSink, FetchOutcome, FormatConverter, ObjectStore, ProgressReporter,
        SbomProvider,
    };
    pub use crate::sbom_processing::domain::{
        Component, CycloneDxDocument, Dialect, ProjectionRow, SourceReference, TableName,
    };
    pub use crate::sbom_processing::services::{LicenseMapper, MergeEngine, SbomProjector};
    pub use crate::shared::Result;
}
