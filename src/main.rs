//! Query MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to explore and query SQL databases (SQLite, PostgreSQL, MySQL).

use clap::Parser;
use query_mcp_server::config::{Config, TransportMode};
use query_mcp_server::db::DbClient;
use query_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting Query MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let connection_config = match config.connection_config() {
        Ok(cc) => cc,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            eprintln!("Usage: query-mcp-server --db-driver <postgres|mysql|sqlite> [options]");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  query-mcp-server --db-driver sqlite --db-path data.db");
            eprintln!(
                "  query-mcp-server --db-driver postgres --db-host db.example.com \\"
            );
            eprintln!("      --db-user app --db-password secret --db-database analytics");
            eprintln!();
            eprintln!("All options can also be set via DB_* environment variables.");
            std::process::exit(1);
        }
    };

    let client = Arc::new(DbClient::connect(connection_config).await?);
    let query_timeout = config.io_timeout_duration();

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(client, query_timeout);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                client,
                query_timeout,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
