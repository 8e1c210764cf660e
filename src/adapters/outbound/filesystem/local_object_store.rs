use super::document_files::{read_bytes, write_bytes};
use crate::ports::outbound::{ObjectMetadata, ObjectStore, ObjectSummary};
use crate::shared::error::PipelineError;
use crate::shared::security::{validate_not_symlink, validate_relative_key};
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the sidecar file holding an object's metadata
const METADATA_SUFFIX: &str = ".meta.json";

/// LocalObjectStore adapter backed by a directory
///
/// Keys map to paths under the root. Metadata is written to a
/// `<key>.meta.json` sidecar, which listings skip.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        validate_relative_key(key).map_err(|e| PipelineError::ObjectStoreFailure {
            location: self.location(key),
            details: e.to_string(),
        })?;
        Ok(self.root.join(key))
    }

    fn failure(&self, key: &str, details: String) -> anyhow::Error {
        PipelineError::ObjectStoreFailure {
            location: self.location(key),
            details,
        }
        .into()
    }

    fn collect(&self, dir: &Path, out: &mut Vec<ObjectSummary>) -> Result<()> {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| self.failure(&dir.display().to_string(), e.to_string()))?
            .filter_map(|entry| entry.ok())
            .collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| self.failure(&path.display().to_string(), e.to_string()))?;

            // Symlinks are neither followed nor listed
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                self.collect(&path, out)?;
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.ends_with(METADATA_SUFFIX) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            out.push(ObjectSummary { key, size });
        }

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, metadata: &ObjectMetadata) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.failure(key, e.to_string()))?;
        }

        write_bytes(&path, &body).map_err(|e| self.failure(key, e.to_string()))?;

        let sidecar = PathBuf::from(format!("{}{}", path.display(), METADATA_SUFFIX));
        let metadata_json = serde_json::to_vec_pretty(&json!({
            "format": metadata.format,
            "source": metadata.source,
        }))?;
        write_bytes(&sidecar, &metadata_json).map_err(|e| self.failure(key, e.to_string()))?;

        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        validate_not_symlink(&self.root, "list")
            .map_err(|e| self.failure(prefix, e.to_string()))?;

        let mut objects = Vec::new();
        self.collect(&self.root, &mut objects)?;
        objects.retain(|object| object.key.starts_with(prefix));
        Ok(objects)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        read_bytes(&path).map_err(|e| self.failure(key, e.to_string()))
    }

    fn location(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }
}
