/// Domain layer - pure SBOM processing logic
///
/// No I/O happens here: documents come in as JSON values or typed
/// aggregates, and the services return new values.
pub mod domain;
pub mod policies;
pub mod services;
