use crate::shared::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// RunContext - scratch space for one pipeline run
///
/// Every intermediate artifact (downloads, unwrapped and converted
/// documents) lives in a private temporary directory that is removed when
/// the context is dropped, on success and failure alike.
pub struct RunContext {
    work_dir: TempDir,
}

impl RunContext {
    pub fn new() -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix("sbom-collector-")
            .tempdir()
            .map_err(|e| anyhow::anyhow!("Failed to create working directory: {}", e))?;
        Ok(Self { work_dir })
    }

    pub fn root(&self) -> &Path {
        self.work_dir.path()
    }

    /// Path of a working file with the given name
    pub fn file(&self, name: &str) -> PathBuf {
        self.work_dir.path().join(name)
    }

    /// Working file derived from another one, e.g. `report.json` -> `report.cdx.json`
    pub fn derived(&self, path: &Path, suffix: &str) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        self.file(&format!("{}.{}.json", stem, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_dir_removed_on_drop() {
        let context = RunContext::new().unwrap();
        let root = context.root().to_path_buf();
        std::fs::write(context.file("a.json"), b"{}").unwrap();
        assert!(root.exists());

        drop(context);

        assert!(!root.exists());
    }

    #[test]
    fn test_derived_path() {
        let context = RunContext::new().unwrap();
        let derived = context.derived(&context.file("report.json"), "cdx");
        assert_eq!(derived, context.file("report.cdx.json"));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let first = RunContext::new().unwrap();
        let second = RunContext::new().unwrap();
        assert_ne!(first.root(), second.root());
    }
}
