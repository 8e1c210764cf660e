/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (providers, converter, storage, console).
pub mod analytical_sink;
pub mod format_converter;
pub mod object_store;
pub mod progress_reporter;
pub mod sbom_provider;

pub use analytical_sink::AnalyticalSink;
pub use format_converter::FormatConverter;
pub use object_store::{ObjectMetadata, ObjectStore, ObjectSummary};
pub use progress_reporter::ProgressReporter;
pub use sbom_provider::{FetchOutcome, SbomProvider};
