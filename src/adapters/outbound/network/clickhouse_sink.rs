use super::http_client::{build_http_client, truncate_body};
use crate::ports::outbound::AnalyticalSink;
use crate::sbom_processing::domain::projection::PROJECTION_COLUMNS;
use crate::sbom_processing::domain::{ProjectionRow, TableName};
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Connection settings for the ClickHouse HTTP interface
#[derive(Debug, Clone)]
pub struct ClickHouseSettings {
    /// Base URL, e.g. `http://localhost:8123`
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

/// ClickHouseSink adapter writing projections over the HTTP interface
///
/// Each statement is POSTed as the request body. Errors are returned as
/// plain `anyhow` errors; the projection use case maps them onto the
/// schema or write failure it was performing.
pub struct ClickHouseSink {
    client: reqwest::Client,
    settings: ClickHouseSettings,
}

impl ClickHouseSink {
    pub fn new(settings: ClickHouseSettings) -> Result<Self> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self { client, settings })
    }

    async fn execute(&self, statement: String) -> Result<String> {
        let url = format!(
            "{}/?database={}",
            self.settings.url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.database)
        );

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(statement);
        if let Some(user) = &self.settings.user {
            request = request.basic_auth(user, self.settings.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("ClickHouse request failed: {}", e))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            anyhow::bail!(
                "ClickHouse returned HTTP {}: {}",
                status,
                truncate_body(body.trim(), 500)
            );
        }

        Ok(body)
    }
}

#[async_trait]
impl AnalyticalSink for ClickHouseSink {
    async fn table_exists(&self, table: &TableName) -> Result<bool> {
        let body = self.execute(format!("EXISTS TABLE {}", table)).await?;
        Ok(parse_count(&body)? > 0)
    }

    async fn column_exists(&self, table: &TableName, column: &str) -> Result<bool> {
        let body = self
            .execute(format!(
                "SELECT count() FROM system.columns WHERE database = currentDatabase() \
                 AND table = '{}' AND name = '{}'",
                escape_literal(table.as_str()),
                escape_literal(column)
            ))
            .await?;
        Ok(parse_count(&body)? > 0)
    }

    async fn create_table(&self, table: &TableName) -> Result<()> {
        self.execute(create_table_statement(table)).await?;
        Ok(())
    }

    async fn add_column(&self, table: &TableName, column: &str, default: &str) -> Result<()> {
        self.execute(add_column_statement(table, column, default))
            .await?;
        Ok(())
    }

    async fn truncate_table(&self, table: &TableName) -> Result<()> {
        self.execute(format!("TRUNCATE TABLE {}", table)).await?;
        Ok(())
    }

    async fn insert_rows(&self, table: &TableName, rows: &[ProjectionRow]) -> Result<()> {
        self.execute(insert_statement(table, rows)).await?;
        Ok(())
    }

    async fn row_count(&self, table: &TableName) -> Result<u64> {
        let body = self.execute(format!("SELECT count() FROM {}", table)).await?;
        parse_count(&body)
    }
}

/// DDL for a fresh projection table
pub fn create_table_statement(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         name String, \
         version String, \
         license String, \
         source String, \
         inserted_at DateTime DEFAULT now()\
         ) ENGINE = MergeTree ORDER BY (name, version, license)",
        table
    )
}

pub fn add_column_statement(table: &TableName, column: &str, default: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} String DEFAULT '{}'",
        table,
        column,
        escape_literal(default)
    )
}

/// Bulk insert in `TabSeparated` format, one line per row
pub fn insert_statement(table: &TableName, rows: &[ProjectionRow]) -> String {
    let mut statement = format!(
        "INSERT INTO {} ({}) FORMAT TabSeparated\n",
        table,
        PROJECTION_COLUMNS.join(", ")
    );
    for row in rows {
        statement.push_str(&escape_tsv(&row.name));
        statement.push('\t');
        statement.push_str(&escape_tsv(&row.version));
        statement.push('\t');
        statement.push_str(&escape_tsv(&row.license));
        statement.push('\t');
        statement.push_str(&escape_tsv(&row.source));
        statement.push('\n');
    }
    statement
}

/// Escapes a value for the `TabSeparated` format
pub fn escape_tsv(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escapes a value for a single-quoted SQL string literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Parses the single-number body returned by `count()` and `EXISTS`
pub fn parse_count(body: &str) -> Result<u64> {
    body.trim()
        .parse::<u64>()
        .map_err(|e| anyhow::anyhow!("Unexpected ClickHouse response '{}': {}", body.trim(), e))
}
