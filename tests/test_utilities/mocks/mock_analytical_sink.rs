use async_trait::async_trait;
use sbom_collector::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockTable {
    /// Column name and default value
    pub columns: Vec<(String, String)>,
    pub rows: Vec<ProjectionRow>,
}

/// In-memory AnalyticalSink recording every DDL call
#[derive(Default, Clone)]
pub struct MockAnalyticalSink {
    tables: Arc<Mutex<HashMap<String, MockTable>>>,
    pub ddl_log: Arc<Mutex<Vec<String>>>,
    fail_add_column: bool,
}

impl MockAnalyticalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose ALTER TABLE fails, e.g. for missing privileges
    pub fn failing_migration() -> Self {
        Self {
            fail_add_column: true,
            ..Self::default()
        }
    }

    /// Seeds a table from before the `source` column existed
    pub fn with_legacy_table(self, table: &str, rows: Vec<ProjectionRow>) -> Self {
        let columns = ["name", "version", "license"]
            .iter()
            .map(|c| (c.to_string(), String::new()))
            .collect();
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), MockTable { columns, rows });
        self
    }

    pub fn table(&self, table: &str) -> Option<MockTable> {
        self.tables.lock().unwrap().get(table).cloned()
    }

    pub fn ddl(&self) -> Vec<String> {
        self.ddl_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticalSink for MockAnalyticalSink {
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
        self.ddl_log
            .lock()
            .unwrap()
            .push(format!("CREATE {}", table));
        let columns = ["name", "version", "license", "source"]
            .iter()
            .map(|c| (c.to_string(), String::new()))
            .collect();
        self.tables.lock().unwrap().insert(
            table.as_str().to_string(),
            MockTable {
                columns,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_column(&self, table: &TableName, column: &str, default: &str) -> Result<()> {
        if self.fail_add_column {
            anyhow::bail!("Code: 497. DB::Exception: Not enough privileges");
        }
        self.ddl_log
            .lock()
            .unwrap()
            .push(format!("ADD {}.{} DEFAULT '{}'", table, column, default));
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .get_mut(table.as_str())
            .ok_or_else(|| anyhow::anyhow!("UNKNOWN_TABLE {}", table))?;
        entry.columns.push((column.to_string(), default.to_string()));
        for row in entry.rows.iter_mut() {
            row.source = default.to_string();
        }
        Ok(())
    }

    async fn truncate_table(&self, table: &TableName) -> Result<()> {
        self.ddl_log
            .lock()
            .unwrap()
            .push(format!("TRUNCATE {}", table));
        if let Some(entry) = self.tables.lock().unwrap().get_mut(table.as_str()) {
            entry.rows.clear();
        }
        Ok(())
    }

    async fn insert_rows(&self, table: &TableName, rows: &[ProjectionRow]) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .get_mut(table.as_str())
            .ok_or_else(|| anyhow::anyhow!("UNKNOWN_TABLE {}", table))?;
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
