/// Converter adapters wrapping external dialect conversion tools
mod cyclonedx_cli;

pub use cyclonedx_cli::{CycloneDxCliConverter, DEFAULT_CONVERTER};
