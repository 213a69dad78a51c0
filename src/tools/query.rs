//! Query execution tool.
//!
//! Implements the `run_select_query` MCP tool. Unlike the other tools, query
//! failures are reported as data in the response body rather than as protocol
//! errors, so callers can inspect the database's message and retry with a
//! corrected statement.

use crate::db::{DbClient, QueryRunner};
use crate::error::DbError;
use crate::models::QueryResult;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Input for the run_select_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL SELECT statement to execute
    pub query: String,
}

/// Output from the run_select_query tool.
///
/// A failed query still produces a normal response; `status` is "error" and
/// `message` carries the database's explanation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Success {
        /// Column names in projection order
        column_names: Vec<String>,
        /// Rows as value tuples matching column_names order
        rows: Vec<Vec<JsonValue>>,
        /// Number of rows returned
        row_count: usize,
    },
    Error {
        /// Always "error"
        status: String,
        /// Failure description, prefixed with "Query failed"
        message: String,
    },
}

// MCP tool output schemas must have an object at the root, which rules out
// the derived untagged-enum schema (a bare anyOf). Both variants serialize
// as objects, so the schema states that at the root and lists the variant
// shapes as alternatives.
impl JsonSchema for QueryResponse {
    fn schema_name() -> Cow<'static, str> {
        "QueryResponse".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "object",
            "anyOf": [
                {
                    "properties": {
                        "column_names": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Column names in projection order"
                        },
                        "rows": {
                            "type": "array",
                            "items": { "type": "array" },
                            "description": "Rows as value tuples matching column_names order"
                        },
                        "row_count": {
                            "type": "integer",
                            "minimum": 0,
                            "description": "Number of rows returned"
                        }
                    },
                    "required": ["column_names", "rows", "row_count"]
                },
                {
                    "properties": {
                        "status": {
                            "type": "string",
                            "const": "error"
                        },
                        "message": {
                            "type": "string",
                            "description": "Failure description, prefixed with \"Query failed\""
                        }
                    },
                    "required": ["status", "message"]
                }
            ]
        })
    }
}

impl QueryResponse {
    fn success(result: QueryResult) -> Self {
        let rows = result
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_json()).collect())
            .collect();
        Self::Success {
            column_names: result.column_names,
            rows,
            row_count: result.row_count,
        }
    }

    fn error(err: &DbError) -> Self {
        // Query errors already carry the "Query failed" prefix
        let message = match err {
            DbError::Query { .. } => err.to_string(),
            other => format!("Query failed: {}", other),
        };
        Self::Error {
            status: "error".to_string(),
            message,
        }
    }
}

/// Handler for the run_select_query tool.
pub struct QueryToolHandler {
    client: Arc<DbClient>,
    runner: QueryRunner,
}

impl QueryToolHandler {
    pub fn new(client: Arc<DbClient>, query_timeout: Duration) -> Self {
        Self {
            client,
            runner: QueryRunner::new(query_timeout),
        }
    }

    /// Execute a SELECT query. Never fails; errors come back in the response.
    pub async fn run_select_query(&self, input: QueryInput) -> QueryResponse {
        info!(query = %input.query, "Running select query");

        match self.runner.run_query(self.client.pool(), &input.query).await {
            Ok(result) => QueryResponse::success(result),
            Err(err) => {
                warn!(error = %err, "Select query failed");
                QueryResponse::error(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::models::{ConnectionConfig, DatabaseType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn handler() -> QueryToolHandler {
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
        QueryToolHandler::new(Arc::new(client), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_successful_query() {
        let handler = handler().await;
        let response = handler
            .run_select_query(QueryInput {
                query: "SELECT id, name FROM test_table ORDER BY id".to_string(),
            })
            .await;

        match response {
            QueryResponse::Success {
                column_names,
                rows,
                row_count,
            } => {
                assert_eq!(column_names, vec!["id", "name"]);
                assert_eq!(row_count, 2);
                assert_eq!(rows[0], vec![serde_json::json!(1), serde_json::json!("Alice")]);
                assert_eq!(rows[1], vec![serde_json::json!(2), serde_json::json!("Bob")]);
            }
            QueryResponse::Error { message, .. } => panic!("unexpected error: {}", message),
        }
    }

    #[tokio::test]
    async fn test_failed_query_returns_error_as_data() {
        let handler = handler().await;
        let response = handler
            .run_select_query(QueryInput {
                query: "SELECT * FROM missing_table".to_string(),
            })
            .await;

        match response {
            QueryResponse::Error { status, message } => {
                assert_eq!(status, "error");
                assert!(message.starts_with("Query failed"), "message: {}", message);
            }
            QueryResponse::Success { .. } => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn test_error_response_serialization() {
        let handler = handler().await;
        let response = handler
            .run_select_query(QueryInput {
                query: "not even sql".to_string(),
            })
            .await;

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("Query failed"));
    }

    #[test]
    fn test_response_schema_root_is_object() {
        let schema = schemars::schema_for!(QueryResponse);
        assert_eq!(schema.as_value()["type"], "object");
    }
}
