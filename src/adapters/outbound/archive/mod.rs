/// Archive adapters for decoding downloaded artifacts (JSON, gzip, zip)
pub mod artifact_decoder;

pub use artifact_decoder::{ArtifactKind, JsonMember};
