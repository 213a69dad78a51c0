//! Result export tool.
//!
//! Implements the `save_query_results` MCP tool: run a SELECT query and write
//! the result set to a local file as CSV (RFC 4180, with header) or JSON
//! (array of objects with native value types).
//!
//! Export failures always raise, including query failures. The format is
//! validated after the query runs, so an unsupported format never leaves a
//! file behind.

use crate::db::{DbClient, QueryRunner};
use crate::error::{DbError, DbResult};
use crate::models::{ExportFormat, ExportSummary, QueryResult};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Input for the save_query_results tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExportInput {
    /// SQL SELECT statement to execute
    pub query: String,
    /// Destination file path on the server host
    pub file_path: String,
    /// Output format: "csv" or "json"
    pub format: String,
}

/// Handler for the save_query_results tool.
pub struct ExportToolHandler {
    client: Arc<DbClient>,
    runner: QueryRunner,
}

impl ExportToolHandler {
    pub fn new(client: Arc<DbClient>, query_timeout: Duration) -> Self {
        Self {
            client,
            runner: QueryRunner::new(query_timeout),
        }
    }

    /// Run a query and save the results to a file.
    pub async fn save_query_results(&self, input: ExportInput) -> DbResult<ExportSummary> {
        info!(
            query = %input.query,
            file_path = %input.file_path,
            format = %input.format,
            "Exporting query results"
        );

        let result = self.runner.run_query(self.client.pool(), &input.query).await?;

        let format = ExportFormat::parse(&input.format)
            .ok_or_else(|| DbError::unsupported_format(&input.format))?;

        match format {
            ExportFormat::Csv => write_csv(&input.file_path, &result)?,
            ExportFormat::Json => write_json(&input.file_path, &result)?,
        }

        let summary = ExportSummary::success(format, result.row_count, result.column_count());
        info!(
            rows_written = summary.rows_written,
            columns = summary.columns,
            "Export complete"
        );
        Ok(summary)
    }
}

fn write_csv(path: &str, result: &QueryResult) -> DbResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(&result.column_names)
        .map_err(csv_error)?;
    for row in &result.rows {
        writer
            .write_record(row.iter().map(|cell| cell.to_csv_field()))
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &str, result: &QueryResult) -> DbResult<()> {
    let objects: Vec<JsonValue> = result
        .rows
        .iter()
        .map(|row| {
            let map: serde_json::Map<String, JsonValue> = result
                .column_names
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), cell.to_json()))
                .collect();
            JsonValue::Object(map)
        })
        .collect();

    let file = File::create(path)?;
    serde_json::to_writer(file, &objects)
        .map_err(|e| DbError::internal(format!("Failed to write JSON: {}", e)))?;
    Ok(())
}

fn csv_error(err: csv::Error) -> DbError {
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => DbError::Io(io_err),
        other => DbError::internal(format!("Failed to write CSV: {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::models::{ConnectionConfig, DatabaseType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn handler() -> ExportToolHandler {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE test_table (id INTEGER, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO test_table VALUES (1, 'Alice'), (2, 'Bob')")
            .execute(&pool)
            .await
            .unwrap();

        let client = DbClient::from_pool(
            DbPool::SQLite(pool),
            ConnectionConfig::default_for(DatabaseType::SQLite),
        );
        ExportToolHandler::new(Arc::new(client), Duration::from_secs(30))
    }

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_csv_export() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "out.csv");

        let summary = handler
            .save_query_results(ExportInput {
                query: "SELECT id, name FROM test_table ORDER BY id".to_string(),
                file_path: path.clone(),
                format: "csv".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(summary.status, "success");
        assert_eq!(summary.format, "csv");
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.columns, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["id,name", "1,Alice", "2,Bob"]);
    }

    #[tokio::test]
    async fn test_csv_export_quotes_special_fields() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "quoted.csv");

        handler
            .save_query_results(ExportInput {
                query: "SELECT 'a,b' AS x, 'say \"hi\"' AS y".to_string(),
                file_path: path.clone(),
                format: "csv".to_string(),
            })
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1).unwrap(), "\"a,b\",\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn test_json_export_native_types() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "out.json");

        handler
            .save_query_results(ExportInput {
                query: "SELECT id, name FROM test_table ORDER BY id".to_string(),
                file_path: path.clone(),
                format: "json".to_string(),
            })
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<serde_json::Map<String, JsonValue>> =
            serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["id"], serde_json::json!(1));
        assert_eq!(parsed[0]["name"], serde_json::json!("Alice"));
        // Column order is preserved in each object
        let keys: Vec<&String> = parsed[0].keys().collect();
        assert_eq!(keys, vec!["id", "name"]);
    }

    #[tokio::test]
    async fn test_unsupported_format_writes_no_file() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "out.xml");

        let result = handler
            .save_query_results(ExportInput {
                query: "SELECT id FROM test_table".to_string(),
                file_path: path.clone(),
                format: "xml".to_string(),
            })
            .await;

        match result {
            Err(DbError::UnsupportedFormat { format }) => assert_eq!(format, "xml"),
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
        assert!(!std::path::Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "never.csv");

        let result = handler
            .save_query_results(ExportInput {
                query: "SELECT * FROM missing_table".to_string(),
                file_path: path.clone(),
                format: "csv".to_string(),
            })
            .await;

        assert!(matches!(result, Err(DbError::Query { .. })));
        assert!(!std::path::Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_export_empty_result_still_writes_header() {
        let handler = handler().await;
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "empty.csv");

        let summary = handler
            .save_query_results(ExportInput {
                query: "SELECT id, name FROM test_table WHERE id > 100".to_string(),
                file_path: path.clone(),
                format: "csv".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(summary.rows_written, 0);
        assert_eq!(summary.columns, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), "id,name");
    }
}
