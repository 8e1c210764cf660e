/// Mock implementations for testing
mod mock_analytical_sink;
mod mock_format_converter;
mod mock_object_store;
mod mock_progress_reporter;
mod mock_sbom_provider;

pub use mock_analytical_sink::MockAnalyticalSink;
pub use mock_format_converter::MockFormatConverter;
pub use mock_object_store::MockObjectStore;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_sbom_provider::MockSbomProvider;
