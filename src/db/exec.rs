//! Query execution.
//!
//! Queries run as raw SQL against the pool (no prepared statements, so
//! multi-statement quirks and driver-specific placeholder syntax never get in
//! the way of ad-hoc SELECTs). Each database type has its own fetch
//! implementation; the code structure is intentionally parallel to make
//! differences obvious.

use crate::db::client::DbPool;
use crate::db::value::RowDecode;
use crate::error::{DbError, DbResult};
use crate::models::QueryResult;
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Runs SQL statements against a pool with a per-query timeout.
#[derive(Debug, Clone)]
pub struct QueryRunner {
    query_timeout: Duration,
}

impl QueryRunner {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    /// Execute a SELECT statement and collect the full result set.
    ///
    /// Column names are recovered from statement metadata when the result has
    /// no rows, so the caller always sees the projection it asked for.
    pub async fn run_query(&self, pool: &DbPool, sql: &str) -> DbResult<QueryResult> {
        let start = Instant::now();
        debug!(sql = %sql, timeout_secs = self.query_timeout.as_secs(), "Executing query");

        let result = match pool {
            DbPool::MySql(p) => mysql::fetch(p, sql, self.query_timeout).await?,
            DbPool::Postgres(p) => postgres::fetch(p, sql, self.query_timeout).await?,
            DbPool::SQLite(p) => sqlite::fetch(p, sql, self.query_timeout).await?,
        };

        debug!(
            rows = result.row_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(result)
    }
}

fn build_result<R: RowDecode>(rows: Vec<R>) -> QueryResult {
    let column_names = match rows.first() {
        Some(row) => row.column_names(),
        None => Vec::new(),
    };
    let cells = rows.iter().map(|r| r.cell_values()).collect();
    QueryResult::new(column_names, cells)
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

fn timeout_error(query_timeout: Duration) -> DbError {
    DbError::timeout("query execution", query_timeout.as_secs() as u32)
}

mod mysql {
    use super::*;
    use sqlx::{Column, Executor, MySqlPool};

    pub async fn fetch(
        pool: &MySqlPool,
        sql: &str,
        query_timeout: Duration,
    ) -> DbResult<QueryResult> {
        let rows_future = pool.fetch(sql).collect::<Vec<_>>();
        let rows = match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results)?,
            Err(_) => return Err(timeout_error(query_timeout)),
        };

        if rows.is_empty() {
            // describe re-prepares the statement. Statements that changed
            // the schema fail that second prepare; they have no projection.
            let names = match pool.describe(sql).await {
                Ok(d) => d.columns().iter().map(|c| c.name().to_string()).collect(),
                Err(_) => Vec::new(),
            };
            return Ok(QueryResult::empty(names));
        }
        Ok(build_result(rows))
    }
}

mod postgres {
    use super::*;
    use sqlx::{Column, Executor, PgPool};

    pub async fn fetch(pool: &PgPool, sql: &str, query_timeout: Duration) -> DbResult<QueryResult> {
        let rows_future = pool.fetch(sql).collect::<Vec<_>>();
        let rows = match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results)?,
            Err(_) => return Err(timeout_error(query_timeout)),
        };

        if rows.is_empty() {
            let names = match pool.describe(sql).await {
                Ok(d) => d.columns().iter().map(|c| c.name().to_string()).collect(),
                Err(_) => Vec::new(),
            };
            return Ok(QueryResult::empty(names));
        }
        Ok(build_result(rows))
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Column, Executor, SqlitePool};

    pub async fn fetch(
        pool: &SqlitePool,
        sql: &str,
        query_timeout: Duration,
    ) -> DbResult<QueryResult> {
        let rows_future = pool.fetch(sql).collect::<Vec<_>>();
        let rows = match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results)?,
            Err(_) => return Err(timeout_error(query_timeout)),
        };

        if rows.is_empty() {
            let names = match pool.describe(sql).await {
                Ok(d) => d.columns().iter().map(|c| c.name().to_string()).collect(),
                Err(_) => Vec::new(),
            };
            return Ok(QueryResult::empty(names));
        }
        Ok(build_result(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        DbPool::SQLite(pool)
    }

    async fn seed(pool: &DbPool, statements: &[&str]) {
        let DbPool::SQLite(p) = pool else {
            unreachable!()
        };
        for sql in statements {
            sqlx::query(sql).execute(p).await.unwrap();
        }
    }

    fn runner() -> QueryRunner {
        QueryRunner::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_select_literal() {
        let pool = memory_pool().await;
        let result = runner().run_query(&pool, "SELECT 1 AS one").await.unwrap();
        assert_eq!(result.column_names, vec!["one"]);
        assert_eq!(result.rows, vec![vec![CellValue::Int(1)]]);
        assert_eq!(result.row_count, 1);
    }

    #[tokio::test]
    async fn test_expression_columns_decode_natively() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[
                "CREATE TABLE t (id INTEGER)",
                "INSERT INTO t VALUES (1), (2), (3)",
            ],
        )
        .await;

        let result = runner()
            .run_query(&pool, "SELECT COUNT(*) AS n, 1.5 AS half, 'ok' AS tag FROM t")
            .await
            .unwrap();
        assert_eq!(
            result.rows[0],
            vec![
                CellValue::Int(3),
                CellValue::Float(1.5),
                CellValue::Text("ok".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_ddl_statement_returns_empty_result() {
        let pool = memory_pool().await;
        let result = runner()
            .run_query(&pool, "CREATE TABLE t (id INTEGER)")
            .await
            .unwrap();
        assert_eq!(result.row_count, 0);
        assert!(result.column_names.is_empty());
    }

    #[tokio::test]
    async fn test_row_order_preserved() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[
                "CREATE TABLE t (id INTEGER, name TEXT)",
                "INSERT INTO t VALUES (2, 'Bob'), (1, 'Alice')",
            ],
        )
        .await;

        let result = runner()
            .run_query(&pool, "SELECT id, name FROM t ORDER BY id")
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], CellValue::Int(1));
        assert_eq!(result.rows[0][1], CellValue::Text("Alice".to_string()));
        assert_eq!(result.rows[1][0], CellValue::Int(2));
    }

    #[tokio::test]
    async fn test_empty_result_keeps_columns() {
        let pool = memory_pool().await;
        seed(&pool, &["CREATE TABLE t (id INTEGER, name TEXT)"]).await;
        let result = runner()
            .run_query(&pool, "SELECT id, name FROM t")
            .await
            .unwrap();
        assert_eq!(result.column_names, vec!["id", "name"]);
        assert_eq!(result.row_count, 0);
    }

    #[tokio::test]
    async fn test_syntax_error_is_query_error() {
        let pool = memory_pool().await;
        let result = runner().run_query(&pool, "SELECT FROM WHERE").await;
        assert!(matches!(result, Err(DbError::Query { .. })));
    }

    #[tokio::test]
    async fn test_null_decodes_to_null_cell() {
        let pool = memory_pool().await;
        let result = runner()
            .run_query(&pool, "SELECT NULL AS missing")
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], CellValue::Null);
    }
}
