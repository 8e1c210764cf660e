use crate::shared::Result;
use async_trait::async_trait;

/// Metadata stored alongside an uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Dialect of the body ("cyclonedx" or "spdx")
    pub format: String,
    /// Source reference of the run that produced the object
    pub source: String,
}

impl ObjectMetadata {
    pub fn new(format: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            source: source.into(),
        }
    }
}

/// Entry returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// ObjectStore port for persisting and reading SBOM documents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `body` under `key`, replacing any existing object
    async fn put_object(&self, key: &str, body: Vec<u8>, metadata: &ObjectMetadata) -> Result<()>;

    /// Lists every object under `prefix`, in the store's listing order
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Downloads the body of `key`
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Human-readable location of `key` (e.g. `s3://bucket/key`)
    fn location(&self, key: &str) -> String;
}
