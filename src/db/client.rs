//! Database client and connection pool.
//!
//! `DbClient` is the explicit connection context for the server: it owns a
//! database-specific pool built from a `ConnectionConfig` and is created once
//! at startup, then shared behind an `Arc`. Pools are database-specific
//! (MySqlPool, PgPool, SqlitePool) to keep full type support.

use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, DatabaseType};
use sqlx::{
    MySqlPool, PgPool, SqlitePool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    postgres::PgPoolOptions, sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

const MAX_POOL_CONNECTIONS: u32 = 5;

/// Database-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
        }
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySQL,
            DbPool::Postgres(_) => DatabaseType::PostgreSQL,
            DbPool::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// A connected database client.
#[derive(Debug, Clone)]
pub struct DbClient {
    pool: DbPool,
    config: ConnectionConfig,
    server_version: Option<String>,
}

impl DbClient {
    /// Connect to the database described by `config`.
    ///
    /// The connection is verified by querying the server version before the
    /// client is returned, so a misconfigured target fails at startup rather
    /// than on the first tool call.
    pub async fn connect(config: ConnectionConfig) -> DbResult<Self> {
        info!(
            db_type = %config.db_type,
            url = %config.masked_url(),
            "Connecting to database"
        );

        let pool = create_pool(&config).await?;
        let server_version = get_server_version(&pool).await;

        info!(
            db_type = %config.db_type,
            server_version = ?server_version,
            "Connected successfully"
        );

        Ok(Self {
            pool,
            config,
            server_version,
        })
    }

    /// Wrap an existing pool. Used by tests that build in-memory databases.
    pub fn from_pool(pool: DbPool, config: ConnectionConfig) -> Self {
        Self {
            pool,
            config,
            server_version: None,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        info!(db_type = %self.db_type(), "Closing database connection");
        self.pool.close().await;
    }
}

/// Create a connection pool for the given configuration.
async fn create_pool(config: &ConnectionConfig) -> DbResult<DbPool> {
    let url = config
        .connection_url()
        .map_err(|e| DbError::connection(e.to_string(), config_suggestion(config.db_type)))?;
    let acquire_timeout = config.connect_timeout;

    match config.db_type {
        DatabaseType::MySQL => {
            let options = MySqlConnectOptions::from_str(&url)
                .map_err(|e| {
                    DbError::connection(
                        format!("Invalid MySQL connection URL: {}", e),
                        config_suggestion(DatabaseType::MySQL),
                    )
                })?
                .charset("utf8mb4");

            let pool = MySqlPoolOptions::new()
                .max_connections(MAX_POOL_CONNECTIONS)
                .acquire_timeout(acquire_timeout)
                .connect_with(options)
                .await
                .map_err(|e| {
                    DbError::connection(
                        format!("Failed to connect: {}", e),
                        connection_suggestion(DatabaseType::MySQL, &e),
                    )
                })?;
            Ok(DbPool::MySql(pool))
        }
        DatabaseType::PostgreSQL => {
            let pool = PgPoolOptions::new()
                .max_connections(MAX_POOL_CONNECTIONS)
                .acquire_timeout(acquire_timeout)
                .connect(&url)
                .await
                .map_err(|e| {
                    DbError::connection(
                        format!("Failed to connect: {}", e),
                        connection_suggestion(DatabaseType::PostgreSQL, &e),
                    )
                })?;
            Ok(DbPool::Postgres(pool))
        }
        DatabaseType::SQLite => {
            let options = SqliteConnectOptions::from_str(&url).map_err(|e| {
                DbError::connection(
                    format!("Invalid SQLite connection URL: {}", e),
                    config_suggestion(DatabaseType::SQLite),
                )
            })?;

            // A single connection keeps in-memory databases alive for the
            // lifetime of the pool.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(acquire_timeout)
                .connect_with(options)
                .await
                .map_err(|e| {
                    DbError::connection(
                        format!("Failed to connect: {}", e),
                        connection_suggestion(DatabaseType::SQLite, &e),
                    )
                })?;
            Ok(DbPool::SQLite(pool))
        }
    }
}

/// Get the server version from the connected database.
async fn get_server_version(pool: &DbPool) -> Option<String> {
    let sql = match pool {
        DbPool::MySql(_) | DbPool::Postgres(_) => "SELECT version()",
        DbPool::SQLite(_) => "SELECT sqlite_version()",
    };

    let result = match pool {
        DbPool::MySql(p) => sqlx::query_scalar::<_, String>(sql).fetch_one(p).await,
        DbPool::Postgres(p) => sqlx::query_scalar::<_, String>(sql).fetch_one(p).await,
        DbPool::SQLite(p) => sqlx::query_scalar::<_, String>(sql).fetch_one(p).await,
    };

    match result {
        Ok(version) => {
            debug!(version = %version, "Got server version");
            Some(version)
        }
        Err(e) => {
            warn!(error = %e, "Failed to get server version");
            None
        }
    }
}

fn config_suggestion(db_type: DatabaseType) -> String {
    match db_type {
        DatabaseType::PostgreSQL => {
            "Check DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_DATABASE".to_string()
        }
        DatabaseType::MySQL => {
            "Check DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_DATABASE".to_string()
        }
        DatabaseType::SQLite => "Check that DB_PATH points to a readable file".to_string(),
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(db_type: DatabaseType, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!(
            "Check that the {} server is running and accessible",
            db_type.display_name()
        );
    }

    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify DB_USER and DB_PASSWORD".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unknown database") {
        return "Check that the database named by DB_DATABASE exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS settings (DB_SECURE, DB_VERIFY_CERT)".to_string();
    }

    config_suggestion(db_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionConfig;

    fn sqlite_memory_config() -> ConnectionConfig {
        ConnectionConfig {
            db_type: DatabaseType::SQLite,
            path: Some(":memory:".to_string()),
            ..ConnectionConfig::default_for(DatabaseType::SQLite)
        }
    }

    #[tokio::test]
    async fn test_connect_sqlite_memory() {
        let client = DbClient::connect(sqlite_memory_config()).await.unwrap();
        assert_eq!(client.db_type(), DatabaseType::SQLite);
        assert!(client.server_version().is_some());
        client.close().await;
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let config = ConnectionConfig {
            db_type: DatabaseType::PostgreSQL,
            host: "127.0.0.1".to_string(),
            port: Some(1),
            connect_timeout: std::time::Duration::from_secs(2),
            ..ConnectionConfig::default_for(DatabaseType::PostgreSQL)
        };
        let result = DbClient::connect(config).await;
        assert!(matches!(result, Err(DbError::Connection { .. })));
    }
}
