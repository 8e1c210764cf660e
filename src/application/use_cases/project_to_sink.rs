use crate::ports::outbound::{AnalyticalSink, ProgressReporter};
use crate::sbom_processing::domain::projection::{SOURCE_COLUMN, SOURCE_COLUMN_DEFAULT};
use crate::sbom_processing::domain::{CycloneDxDocument, SourceReference, TableName};
use crate::sbom_processing::services::{LicenseMapper, SbomProjector};
use crate::shared::error::PipelineError;
use crate::shared::Result;
use std::sync::Arc;

/// What happened to the destination table during a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    Created,
    SourceColumnAdded,
    Unchanged,
}

/// ProjectionReport - outcome of writing one document to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionReport {
    pub table: TableName,
    pub schema_change: SchemaChange,
    pub rows_written: usize,
    pub mapped_licenses: usize,
}

/// ProjectToSinkUseCase - flattens a canonical document into the analytical sink
///
/// Prepares the table (create, or add the `source` column to a table from
/// before it existed), optionally truncates it, then bulk-inserts one row
/// per component. Writes are not transactional.
pub struct ProjectToSinkUseCase {
    sink: Arc<dyn AnalyticalSink>,
    license_mapper: LicenseMapper,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl ProjectToSinkUseCase {
    pub fn new(
        sink: Arc<dyn AnalyticalSink>,
        license_mapper: LicenseMapper,
        progress_reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            sink,
            license_mapper,
            progress_reporter,
        }
    }

    /// Projects `document` into `table`
    ///
    /// # Errors
    /// `SchemaMigrationFailure` while preparing the table, `SinkWriteFailure`
    /// while truncating or inserting
    pub async fn execute(
        &self,
        document: &CycloneDxDocument,
        table: &TableName,
        default_source: &SourceReference,
        truncate: bool,
    ) -> Result<ProjectionReport> {
        let schema_change = self.prepare_schema(table).await?;

        if truncate {
            self.progress_reporter
                .report(&format!("🧹 Truncating table {}", table));
            self.sink
                .truncate_table(table)
                .await
                .map_err(|e| write_failure(table, e))?;
        }

        let projection = SbomProjector::project(document, default_source, &self.license_mapper);
        if projection.mapped_licenses > 0 {
            self.progress_reporter.report(&format!(
                "📜 Filled {} license(s) from the license mapping",
                projection.mapped_licenses
            ));
        }

        if projection.rows.is_empty() {
            self.progress_reporter
                .report(&format!("ℹ️  No components to insert into {}", table));
        } else {
            self.progress_reporter.report(&format!(
                "💾 Inserting {} row(s) into {}...",
                projection.rows.len(),
                table
            ));
            self.sink
                .insert_rows(table, &projection.rows)
                .await
                .map_err(|e| write_failure(table, e))?;
        }

        Ok(ProjectionReport {
            table: table.clone(),
            schema_change,
            rows_written: projection.rows.len(),
            mapped_licenses: projection.mapped_licenses,
        })
    }

    async fn prepare_schema(&self, table: &TableName) -> Result<SchemaChange> {
        let exists = self
            .sink
            .table_exists(table)
            .await
            .map_err(|e| schema_failure(table, e))?;

        if !exists {
            self.progress_reporter
                .report(&format!("🗄️  Creating table {}", table));
            self.sink
                .create_table(table)
                .await
                .map_err(|e| schema_failure(table, e))?;
            return Ok(SchemaChange::Created);
        }

        let has_source = self
            .sink
            .column_exists(table, SOURCE_COLUMN)
            .await
            .map_err(|e| schema_failure(table, e))?;
        if has_source {
            return Ok(SchemaChange::Unchanged);
        }

        let rows_before = self
            .sink
            .row_count(table)
            .await
            .map_err(|e| schema_failure(table, e))?;
        self.progress_reporter.report(&format!(
            "🛠️  Adding '{}' column to {} (default '{}')",
            SOURCE_COLUMN, table, SOURCE_COLUMN_DEFAULT
        ));
        self.sink
            .add_column(table, SOURCE_COLUMN, SOURCE_COLUMN_DEFAULT)
            .await
            .map_err(|e| schema_failure(table, e))?;

        // Existing rows must survive the migration untouched
        let rows_after = self
            .sink
            .row_count(table)
            .await
            .map_err(|e| schema_failure(table, e))?;
        if rows_after != rows_before {
            return Err(PipelineError::SchemaMigrationFailure {
                table: table.to_string(),
                details: format!(
                    "row count changed from {} to {} while adding the '{}' column",
                    rows_before, rows_after, SOURCE_COLUMN
                ),
            }
            .into());
        }
        self.progress_reporter.report(&format!(
            "   {} existing row(s) kept with source '{}'",
            rows_after, SOURCE_COLUMN_DEFAULT
        ));
        Ok(SchemaChange::SourceColumnAdded)
    }
}

fn schema_failure(table: &TableName, error: anyhow::Error) -> anyhow::Error {
    PipelineError::SchemaMigrationFailure {
        table: table.to_string(),
        details: format!("{:#}", error),
    }
    .into()
}

fn write_failure(table: &TableName, error: anyhow::Error) -> anyhow::Error {
    PipelineError::SinkWriteFailure {
        table: table.to_string(),
        details: format!("{:#}", error),
    }
    .into()
}
