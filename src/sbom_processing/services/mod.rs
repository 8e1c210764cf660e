pub mod candidate_filter;
pub mod component_deduplicator;
pub mod envelope_resolver;
pub mod format_detector;
pub mod license_mapper;
pub mod merge_engine;
pub mod sbom_generator;
pub mod sbom_projector;
pub mod source_inference;
pub mod spdx_compat;

pub use candidate_filter::CandidateFilter;
pub use component_deduplicator::ComponentDeduplicator;
pub use envelope_resolver::EnvelopeResolver;
pub use format_detector::FormatDetector;
pub use license_mapper::LicenseMapper;
pub use merge_engine::{MergeEngine, MergeInput, MergeOutcome};
pub use sbom_generator::SbomGenerator;
pub use sbom_projector::{Projection, SbomProjector};
pub use source_inference::SourceInference;
pub use spdx_compat::SpdxCompatibilityPatch;
