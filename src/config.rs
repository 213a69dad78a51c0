//! Configuration handling for the Query MCP Server.
//!
//! Connection settings follow environment-style configuration (`DB_*`
//! variables with documented defaults, read once at startup) while server
//! settings use `MCP_*` variables. Everything is also settable via CLI flags.

use crate::models::{ConnectionConfig, DatabaseType};
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 300;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the Query MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "query-mcp-server",
    about = "MCP server exposing read-oriented database tools - list schemas, run SELECT queries, export results",
    version,
    author
)]
pub struct Config {
    /// Database driver (postgres, mysql, or sqlite)
    #[arg(long, value_enum, default_value = "postgres", env = "DB_DRIVER")]
    pub db_driver: DatabaseType,

    /// Database server host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// Database server port (driver default when omitted)
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    /// Username for authentication
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// Password for authentication (sensitive - never logged)
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database name to connect to
    #[arg(long, env = "DB_DATABASE")]
    pub db_database: Option<String>,

    /// Database file path (SQLite only; use ":memory:" for an in-memory database)
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<String>,

    /// Enable TLS for the database connection
    #[arg(
        long,
        env = "DB_SECURE",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub db_secure: bool,

    /// Verify the server certificate when TLS is enabled
    #[arg(
        long,
        env = "DB_VERIFY_CERT",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub db_verify_cert: bool,

    /// Connection establishment timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "DB_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Send/receive timeout in seconds, applied to each query round-trip
    #[arg(
        long,
        default_value_t = DEFAULT_IO_TIMEOUT_SECS,
        env = "DB_IO_TIMEOUT"
    )]
    pub io_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            db_driver: DatabaseType::PostgreSQL,
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: None,
            db_user: None,
            db_password: None,
            db_database: None,
            db_path: None,
            db_secure: false,
            db_verify_cert: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            io_timeout: DEFAULT_IO_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Assemble the database connection configuration from the parsed options.
    pub fn connection_config(&self) -> Result<ConnectionConfig, String> {
        if self.db_driver == DatabaseType::SQLite && self.db_path.is_none() {
            return Err(
                "SQLite requires a database file path. Set DB_PATH or pass --db-path.".to_string(),
            );
        }

        Ok(ConnectionConfig {
            db_type: self.db_driver,
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_database.clone(),
            path: self.db_path.clone(),
            secure: self.db_secure,
            verify_cert: self.db_verify_cert,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            io_timeout: Duration::from_secs(self.io_timeout),
        })
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Get the send/receive timeout as a Duration.
    pub fn io_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.io_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.db_driver, DatabaseType::PostgreSQL);
        assert_eq!(config.db_host, DEFAULT_DB_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert!(config.db_verify_cert);
        assert!(!config.db_secure);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_timeout_durations() {
        let config = Config {
            connect_timeout: 15,
            io_timeout: 120,
            ..Config::default()
        };
        assert_eq!(config.connect_timeout_duration(), Duration::from_secs(15));
        assert_eq!(config.io_timeout_duration(), Duration::from_secs(120));
    }

    #[test]
    fn test_connection_config_defaults() {
        let config = Config::default();
        let conn = config.connection_config().unwrap();
        assert_eq!(conn.db_type, DatabaseType::PostgreSQL);
        assert_eq!(conn.host, "localhost");
        assert!(conn.port.is_none());
        assert_eq!(conn.connect_timeout, Duration::from_secs(30));
        assert_eq!(conn.io_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_sqlite_requires_path() {
        let config = Config {
            db_driver: DatabaseType::SQLite,
            ..Config::default()
        };
        let err = config.connection_config().unwrap_err();
        assert!(err.contains("DB_PATH"));
    }

    #[test]
    fn test_sqlite_with_path() {
        let config = Config {
            db_driver: DatabaseType::SQLite,
            db_path: Some(":memory:".to_string()),
            ..Config::default()
        };
        let conn = config.connection_config().unwrap();
        assert_eq!(conn.path.as_deref(), Some(":memory:"));
    }
}
