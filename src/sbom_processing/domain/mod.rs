pub mod component;
pub mod dialect;
pub mod document;
pub mod projection;
pub mod sbom_metadata;
pub mod source_reference;

pub use component::Component;
pub use dialect::Dialect;
pub use document::{CycloneDxDocument, CYCLONEDX_BOM_FORMAT, MERGED_COMPONENT_NAME};
pub use projection::{ProjectionRow, TableName};
pub use sbom_metadata::SbomMetadata;
pub use source_reference::{SourceReference, UNKNOWN_VALUE};
