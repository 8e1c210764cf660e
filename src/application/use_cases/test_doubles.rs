//! In-process doubles for the outbound ports, shared by the use case tests

use crate::ports::outbound::{
    AnalyticalSink, FetchOutcome, FormatConverter, ProgressReporter, SbomProvider,
};
use crate::sbom_processing::domain::{Dialect, ProjectionRow, TableName};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct ConversionCall {
    pub input: PathBuf,
    pub from: Dialect,
    pub to: Dialect,
}

/// Converter that records calls and writes a canned document per target
pub struct RecordingConverter {
    calls: Mutex<Vec<ConversionCall>>,
    cyclonedx_output: Value,
    fail: bool,
}

impl RecordingConverter {
    pub fn new() -> Self {
        Self::with_cyclonedx_output(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "metadata": {"component": {"name": "converted-target"}},
            "components": [{"name": "converted-pkg", "version": "1.0.0"}]
        }))
    }

    pub fn with_cyclonedx_output(cyclonedx_output: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cyclonedx_output,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<ConversionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormatConverter for RecordingConverter {
    async fn convert(&self, input: &Path, from: Dialect, to: Dialect, output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(ConversionCall {
            input: input.to_path_buf(),
            from,
            to,
        });
        if self.fail {
            return Err(PipelineError::ConversionFailure {
                from: from.to_string(),
                to: to.to_string(),
                details: "converter exited with status 1".to_string(),
            }
            .into());
        }
        let document = match to {
            Dialect::Spdx => json!({"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}),
            _ => self.cyclonedx_output.clone(),
        };
        std::fs::write(output, serde_json::to_vec(&document)?)?;
        Ok(())
    }
}

/// Reporter that keeps every message for assertions
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn report_progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}

    fn report_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn report_completion(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct SinkTable {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<ProjectionRow>,
}

/// Sink holding tables in memory; a column added with a default back-fills
/// existing rows the way a real column default would read
#[derive(Default)]
pub struct InMemorySink {
    tables: Mutex<HashMap<String, SinkTable>>,
    fail_inserts: bool,
    lossy_migration: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    /// Seeds a table created before the `source` column existed
    pub fn with_legacy_table(self, table: &str, rows: Vec<ProjectionRow>) -> Self {
        let columns = ["name", "version", "license"]
            .iter()
            .map(|c| (c.to_string(), String::new()))
            .collect();
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), SinkTable { columns, rows });
        self
    }

    /// Makes `add_column` drop every existing row
    pub fn with_lossy_migration(mut self) -> Self {
        self.lossy_migration = true;
        self
    }

    pub fn table(&self, table: &str) -> Option<SinkTable> {
        self.tables.lock().unwrap().get(table).cloned()
    }
}

#[async_trait]
impl AnalyticalSink for InMemorySink {
    async fn table_exists(&self, table: &TableName) -> Result<bool> {
        Ok(self.tables.lock().unwrap().contains_key(table.as_str()))
    }

    async fn column_exists(&self, table: &TableName, column: &str) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table.as_str())
            .is_some_and(|t| t.columns.iter().any(|(name, _)| name == column)))
    }

    async fn create_table(&self, table: &TableName) -> Result<()> {
        let columns = ["name", "version", "license", "source"]
            .iter()
            .map(|c| (c.to_string(), String::new()))
            .collect();
        self.tables
            .lock()
            .unwrap()
            .entry(table.as_str().to_string())
            .or_insert(SinkTable {
                columns,
                rows: Vec::new(),
            });
        Ok(())
    }

    async fn add_column(&self, table: &TableName, column: &str, default: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .get_mut(table.as_str())
            .ok_or_else(|| anyhow::anyhow!("table {} does not exist", table))?;
        entry.columns.push((column.to_string(), default.to_string()));
        if self.lossy_migration {
            entry.rows.clear();
        }
        if column == "source" {
            for row in entry.rows.iter_mut() {
                row.source = default.to_string();
            }
        }
        Ok(())
    }

    async fn truncate_table(&self, table: &TableName) -> Result<()> {
        if let Some(entry) = self.tables.lock().unwrap().get_mut(table.as_str()) {
            entry.rows.clear();
        }
        Ok(())
    }

    async fn insert_rows(&self, table: &TableName, rows: &[ProjectionRow]) -> Result<()> {
        if self.fail_inserts {
            anyhow::bail!("Code: 241. DB::Exception: Memory limit exceeded");
        }
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .get_mut(table.as_str())
            .ok_or_else(|| anyhow::anyhow!("table {} does not exist", table))?;
        entry.rows.extend_from_slice(rows);
        Ok(())
    }

    async fn row_count(&self, table: &TableName) -> Result<u64> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table.as_str())
            .map(|t| t.rows.len() as u64)
            .unwrap_or(0))
    }
}

/// Provider that writes pre-baked documents instead of calling an API
pub struct StaticProvider {
    documents: Vec<Value>,
}

impl StaticProvider {
    pub fn single(document: Value) -> Self {
        Self {
            documents: vec![document],
        }
    }

    pub fn multiple(documents: Vec<Value>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl SbomProvider for StaticProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn default_source(&self) -> String {
        "octo/repo".to_string()
    }

    fn table_identifier(&self) -> String {
        "octo/repo".to_string()
    }

    async fn fetch(&self, output: &Path) -> Result<FetchOutcome> {
        if self.documents.len() == 1 {
            std::fs::write(output, serde_json::to_vec(&self.documents[0])?)?;
            return Ok(FetchOutcome::Single(output.to_path_buf()));
        }
        let mut paths = Vec::new();
        for (index, document) in self.documents.iter().enumerate() {
            let path = output.with_file_name(format!("member-{}.json", index + 1));
            std::fs::write(&path, serde_json::to_vec(document)?)?;
            paths.push(path);
        }
        Ok(FetchOutcome::Multiple(paths))
    }
}
