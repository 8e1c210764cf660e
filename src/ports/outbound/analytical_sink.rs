use crate::sbom_processing::domain::{ProjectionRow, TableName};
use crate::shared::Result;
use async_trait::async_trait;

/// AnalyticalSink port for the tabular SBOM projection
///
/// Table names are already sanitized by `TableName`, so implementations may
/// interpolate them into statements directly.
#[async_trait]
pub trait AnalyticalSink: Send + Sync {
    async fn table_exists(&self, table: &TableName) -> Result<bool>;

    async fn column_exists(&self, table: &TableName, column: &str) -> Result<bool>;

    /// Creates the table with `name, version, license, source, inserted_at`
    async fn create_table(&self, table: &TableName) -> Result<()>;

    /// Adds a `String` column with the given default value
    async fn add_column(&self, table: &TableName, column: &str, default: &str) -> Result<()>;

    async fn truncate_table(&self, table: &TableName) -> Result<()>;

    /// Writes all rows in a single bulk insert
    async fn insert_rows(&self, table: &TableName, rows: &[ProjectionRow]) -> Result<()>;

    /// Counts stored rows; used to verify that a schema migration kept them
    async fn row_count(&self, table: &TableName) -> Result<u64>;
}
