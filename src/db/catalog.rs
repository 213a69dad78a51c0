//! Catalog introspection.
//!
//! Lists databases and tables with their comments and columns. SQL queries
//! are organized in the `queries` submodule with constants for each database
//! type; database-specific implementations live in their respective
//! submodules, each providing the same interface.
//!
//! Comments come back as empty strings when the database has none. Columns
//! are always returned in declaration order.

use crate::db::client::DbPool;
use crate::error::DbResult;
use crate::models::{ColumnDescriptor, TableDescriptor};
use tracing::debug;

/// Catalog reader for database and table metadata.
pub struct CatalogReader;

impl CatalogReader {
    /// List database names known to the server, in the server's catalog order.
    pub async fn list_databases(pool: &DbPool) -> DbResult<Vec<String>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_databases(p).await,
            DbPool::MySql(p) => mysql::list_databases(p).await,
            DbPool::SQLite(p) => sqlite::list_databases(p).await,
        }
    }

    /// List tables in a database, with comments and columns.
    ///
    /// `like` filters table names with the SQL LIKE pattern syntax. For
    /// PostgreSQL the database argument selects the schema; for SQLite it is
    /// ignored since a connection sees exactly one database file.
    pub async fn list_tables(
        pool: &DbPool,
        database: &str,
        like: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_tables(p, database, like).await,
            DbPool::MySql(p) => mysql::list_tables(p, database, like).await,
            DbPool::SQLite(p) => sqlite::list_tables(p, like).await,
        }
    }
}

mod queries {
    pub mod postgres {
        pub const LIST_DATABASES: &str = r#"
            SELECT datname FROM pg_database
            WHERE datistemplate = false
            ORDER BY datname
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT
                t.table_name,
                obj_description((quote_ident($1) || '.' || quote_ident(t.table_name))::regclass) AS table_comment
            FROM information_schema.tables t
            WHERE t.table_schema = $1
            AND t.table_type = 'BASE TABLE'
            ORDER BY t.table_name
            "#;

        pub const LIST_TABLES_LIKE: &str = r#"
            SELECT
                t.table_name,
                obj_description((quote_ident($1) || '.' || quote_ident(t.table_name))::regclass) AS table_comment
            FROM information_schema.tables t
            WHERE t.table_schema = $1
            AND t.table_type = 'BASE TABLE'
            AND t.table_name LIKE $2
            ORDER BY t.table_name
            "#;

        pub const LIST_COLUMNS: &str = r#"
            SELECT
                c.column_name,
                format_type(a.atttypid, a.atttypmod) AS column_type,
                col_description(t.oid, a.attnum) AS column_comment
            FROM information_schema.columns c
            JOIN pg_class t ON t.relname = c.table_name
            JOIN pg_namespace n ON n.oid = t.relnamespace AND n.nspname = c.table_schema
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
            WHERE c.table_name = $1 AND c.table_schema = $2
            ORDER BY c.ordinal_position
            "#;
    }

    pub mod mysql {
        pub const LIST_DATABASES: &str = r#"
            SELECT CONVERT(SCHEMA_NAME USING utf8) AS SCHEMA_NAME
            FROM information_schema.SCHEMATA
            ORDER BY SCHEMA_NAME
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT
                CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME,
                CONVERT(TABLE_COMMENT USING utf8) AS TABLE_COMMENT
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ?
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const LIST_TABLES_LIKE: &str = r#"
            SELECT
                CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME,
                CONVERT(TABLE_COMMENT USING utf8) AS TABLE_COMMENT
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ?
            AND TABLE_TYPE = 'BASE TABLE'
            AND TABLE_NAME LIKE ?
            ORDER BY TABLE_NAME
            "#;

        pub const LIST_COLUMNS: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
                CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
                CONVERT(COLUMN_COMMENT USING utf8) AS COLUMN_COMMENT
            FROM information_schema.columns
            WHERE TABLE_NAME = ? AND TABLE_SCHEMA = ?
            ORDER BY ORDINAL_POSITION
            "#;
    }

    pub mod sqlite {
        pub const LIST_DATABASES: &str = "PRAGMA database_list";

        pub const LIST_TABLES: &str = r#"
            SELECT name, sql FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;

        pub const LIST_TABLES_LIKE: &str = r#"
            SELECT name, sql FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            AND name LIKE ?
            ORDER BY name
            "#;
    }
}

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn list_databases(pool: &PgPool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_DATABASES)
            .fetch_all(pool)
            .await?;

        let databases: Vec<String> = rows.iter().map(|row| row.get("datname")).collect();
        debug!(count = databases.len(), "Listed PostgreSQL databases");
        Ok(databases)
    }

    pub async fn list_tables(
        pool: &PgPool,
        schema: &str,
        like: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        let rows = match like {
            Some(pattern) => {
                sqlx::query(queries::postgres::LIST_TABLES_LIKE)
                    .bind(schema)
                    .bind(pattern)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query(queries::postgres::LIST_TABLES)
                    .bind(schema)
                    .fetch_all(pool)
                    .await?
            }
        };

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get("table_name");
            let comment: Option<String> = row.try_get("table_comment").ok().flatten();

            let columns = fetch_columns(pool, &name, schema).await?;
            tables.push(TableDescriptor {
                name,
                comment: comment.unwrap_or_default(),
                columns,
                create_table_query: None,
            });
        }

        debug!(count = tables.len(), schema = schema, "Listed PostgreSQL tables");
        Ok(tables)
    }

    async fn fetch_columns(
        pool: &PgPool,
        table_name: &str,
        schema: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::postgres::LIST_COLUMNS)
            .bind(table_name)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("column_name");
                let column_type: String = row.get("column_type");
                let comment: Option<String> = row.try_get("column_comment").ok().flatten();
                ColumnDescriptor {
                    name,
                    column_type,
                    comment: comment.unwrap_or_default(),
                }
            })
            .collect())
    }
}

mod mysql {
    use super::*;
    use sqlx::MySqlPool;

    /// Safely get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &sqlx::mysql::MySqlRow, column: &str) -> String {
        use sqlx::Row;
        row.try_get::<String, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(column)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
            .unwrap_or_default()
    }

    pub async fn list_databases(pool: &MySqlPool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_DATABASES)
            .fetch_all(pool)
            .await?;

        let databases: Vec<String> = rows
            .iter()
            .map(|row| get_string(row, "SCHEMA_NAME"))
            .filter(|name| !name.is_empty())
            .collect();
        debug!(count = databases.len(), "Listed MySQL databases");
        Ok(databases)
    }

    pub async fn list_tables(
        pool: &MySqlPool,
        database: &str,
        like: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        let rows = match like {
            Some(pattern) => {
                sqlx::query(queries::mysql::LIST_TABLES_LIKE)
                    .bind(database)
                    .bind(pattern)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query(queries::mysql::LIST_TABLES)
                    .bind(database)
                    .fetch_all(pool)
                    .await?
            }
        };

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = get_string(row, "TABLE_NAME");
            if name.is_empty() {
                continue;
            }
            let comment = get_string(row, "TABLE_COMMENT");

            let columns = fetch_columns(pool, &name, database).await?;
            tables.push(TableDescriptor {
                name,
                comment,
                columns,
                create_table_query: None,
            });
        }

        debug!(count = tables.len(), database = database, "Listed MySQL tables");
        Ok(tables)
    }

    async fn fetch_columns(
        pool: &MySqlPool,
        table_name: &str,
        database: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::mysql::LIST_COLUMNS)
            .bind(table_name)
            .bind(database)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| ColumnDescriptor {
                name: get_string(row, "COLUMN_NAME"),
                column_type: get_string(row, "COLUMN_TYPE"),
                comment: get_string(row, "COLUMN_COMMENT"),
            })
            .collect())
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_databases(pool: &SqlitePool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::LIST_DATABASES)
            .fetch_all(pool)
            .await?;

        let databases: Vec<String> = rows.iter().map(|row| row.get("name")).collect();
        debug!(count = databases.len(), "Listed SQLite databases");
        Ok(databases)
    }

    pub async fn list_tables(
        pool: &SqlitePool,
        like: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        let rows = match like {
            Some(pattern) => {
                sqlx::query(queries::sqlite::LIST_TABLES_LIKE)
                    .bind(pattern)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query(queries::sqlite::LIST_TABLES)
                    .fetch_all(pool)
                    .await?
            }
        };

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get("name");
            let create_sql: Option<String> = row.try_get("sql").ok().flatten();

            let columns = fetch_columns(pool, &name).await?;
            // SQLite has no comment storage, so comments are always empty
            tables.push(TableDescriptor {
                name,
                comment: String::new(),
                columns,
                create_table_query: create_sql,
            });
        }

        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    async fn fetch_columns(pool: &SqlitePool, table_name: &str) -> DbResult<Vec<ColumnDescriptor>> {
        let pragma_query = format!("PRAGMA table_info('{}')", table_name.replace('\'', "''"));
        let rows = sqlx::query(&pragma_query).fetch_all(pool).await?;

        // PRAGMA table_info returns rows in column declaration order (cid)
        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get("name");
                let column_type: String = row.get("type");
                ColumnDescriptor {
                    name,
                    column_type,
                    comment: String::new(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, balance REAL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        DbPool::SQLite(pool)
    }

    #[tokio::test]
    async fn test_list_databases_sqlite() {
        let pool = memory_pool().await;
        let databases = CatalogReader::list_databases(&pool).await.unwrap();
        assert_eq!(databases, vec!["main"]);
    }

    #[tokio::test]
    async fn test_list_tables_ordered_with_columns() {
        let pool = memory_pool().await;
        let tables = CatalogReader::list_tables(&pool, "main", None).await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "orders");
        assert_eq!(tables[1].name, "users");

        let users = &tables[1];
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "balance"]);
        assert_eq!(users.columns[2].column_type, "REAL");
        assert!(users.create_table_query.as_deref().unwrap().contains("CREATE TABLE"));
    }

    #[tokio::test]
    async fn test_list_tables_like_filter() {
        let pool = memory_pool().await;
        let tables = CatalogReader::list_tables(&pool, "main", Some("user%"))
            .await
            .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "users");

        let none = CatalogReader::list_tables(&pool, "main", Some("zzz%"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_comments_default_to_empty_strings() {
        let pool = memory_pool().await;
        let tables = CatalogReader::list_tables(&pool, "main", None).await.unwrap();
        for table in &tables {
            assert_eq!(table.comment, "");
            for column in &table.columns {
                assert_eq!(column.comment, "");
            }
        }
    }

    #[tokio::test]
    async fn test_list_tables_idempotent() {
        let pool = memory_pool().await;
        let first = CatalogReader::list_tables(&pool, "main", None).await.unwrap();
        let second = CatalogReader::list_tables(&pool, "main", None).await.unwrap();
        let names = |tables: &[TableDescriptor]| {
            tables.iter().map(|t| t.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
    }
}
