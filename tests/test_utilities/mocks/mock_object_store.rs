use async_trait::async_trait;
use sbom_collector::ports::outbound::{ObjectMetadata, ObjectSummary};
use sbom_collector::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
}

/// In-memory ObjectStore; listing is in key order like S3
#[derive(Default, Clone)]
pub struct MockObjectStore {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, key: &str, value: &serde_json::Value) -> Self {
        self.insert(key, serde_json::to_vec(value).unwrap(), "cyclonedx");
        self
    }

    pub fn with_bytes(self, key: &str, body: &[u8]) -> Self {
        self.insert(key, body.to_vec(), "unknown");
        self
    }

    fn insert(&self, key: &str, body: Vec<u8>, format: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: ObjectMetadata::new(format, "fixture"),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        self.get(key)
            .map(|object| serde_json::from_slice(&object.body).unwrap())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, metadata: &ObjectMetadata) -> Result<()> {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
            })
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.get(key)
            .map(|object| object.body)
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", key))
    }

    fn location(&self, key: &str) -> String {
        format!("mem://bucket/{}", key)
    }
}
