//! Schema introspection tools.
//!
//! Implements the `list_databases` and `list_tables` MCP tools on top of the
//! catalog reader. Failures here are protocol errors, not data.

use crate::db::DbClient;
use crate::db::catalog::CatalogReader;
use crate::error::DbResult;
use crate::models::TableDescriptor;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database (PostgreSQL: schema) to list tables from
    pub database: String,
    /// Optional SQL LIKE pattern to filter table names
    #[serde(default)]
    pub like: Option<String>,
}

/// Output of the list_databases tool.
///
/// Tool results must serialize as objects, so the list rides in a field.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    /// Database names in catalog order
    pub databases: Vec<String>,
    /// Number of databases returned
    pub count: usize,
}

/// Output of the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Tables with their comments and columns in declaration order
    pub tables: Vec<TableDescriptor>,
    /// Number of tables returned
    pub count: usize,
}

/// Handler for the schema tools.
pub struct SchemaToolHandler {
    client: Arc<DbClient>,
}

impl SchemaToolHandler {
    pub fn new(client: Arc<DbClient>) -> Self {
        Self { client }
    }

    /// List database names known to the server.
    pub async fn list_databases(&self) -> DbResult<ListDatabasesOutput> {
        let databases = CatalogReader::list_databases(self.client.pool()).await?;
        info!(count = databases.len(), "Listed databases");
        let count = databases.len();
        Ok(ListDatabasesOutput { databases, count })
    }

    /// List tables in a database with comments and columns.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let tables = CatalogReader::list_tables(
            self.client.pool(),
            &input.database,
            input.like.as_deref(),
        )
        .await?;
        info!(
            database = %input.database,
            count = tables.len(),
            "Listed tables"
        );
        let count = tables.len();
        Ok(ListTablesOutput { tables, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::models::{ConnectionConfig, DatabaseType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn handler() -> SchemaToolHandler {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE events (id INTEGER PRIMARY KEY, payload TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let client = DbClient::from_pool(
            DbPool::SQLite(pool),
            ConnectionConfig::default_for(DatabaseType::SQLite),
        );
        SchemaToolHandler::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_list_databases() {
        let handler = handler().await;
        let output = handler.list_databases().await.unwrap();
        assert_eq!(output.databases, vec!["main"]);
        assert_eq!(output.count, 1);
    }

    #[tokio::test]
    async fn test_list_tables() {
        let handler = handler().await;
        let output = handler
            .list_tables(ListTablesInput {
                database: "main".to_string(),
                like: None,
            })
            .await
            .unwrap();
        assert_eq!(output.count, 1);
        assert_eq!(output.tables[0].name, "events");
        assert_eq!(output.tables[0].columns.len(), 2);
        assert_eq!(output.tables[0].comment, "");
    }

    #[tokio::test]
    async fn test_list_tables_like_no_match() {
        let handler = handler().await;
        let output = handler
            .list_tables(ListTablesInput {
                database: "main".to_string(),
                like: Some("user%".to_string()),
            })
            .await
            .unwrap();
        assert!(output.tables.is_empty());
        assert_eq!(output.count, 0);
    }
}
