use async_trait::async_trait;
use sbom_collector::prelude::*;
use serde_json::Value;
use std::path::Path;

/// SbomProvider returning canned payloads, one file per document
pub struct MockSbomProvider {
    name: String,
    target: String,
    documents: Vec<Value>,
}

impl MockSbomProvider {
    pub fn single(name: &str, target: &str, document: Value) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            documents: vec![document],
        }
    }

    /// Provider whose artifact was an archive with several members
    pub fn archive(name: &str, target: &str, documents: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            documents,
        }
    }
}

#[async_trait]
impl SbomProvider for MockSbomProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_source(&self) -> String {
        self.target.clone()
    }

    fn table_identifier(&self) -> String {
        self.target.clone()
    }

    async fn fetch(&self, output: &Path) -> Result<FetchOutcome> {
        if let [document] = self.documents.as_slice() {
            std::fs::write(output, serde_json::to_vec(document)?)?;
            return Ok(FetchOutcome::Single(output.to_path_buf()));
        }

        let mut paths = Vec::with_capacity(self.documents.len());
        for (index, document) in self.documents.iter().enumerate() {
            let path = output.with_file_name(format!("artifact-{}.json", index + 1));
            std::fs::write(&path, serde_json::to_vec(document)?)?;
            paths.push(path);
        }
        Ok(FetchOutcome::Multiple(paths))
    }
}
