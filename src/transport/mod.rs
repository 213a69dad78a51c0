//! Transport layer for the MCP server.
//!
//! Two transports are shipped, selected by configuration at startup:
//! - `StdioTransport` speaks MCP over stdin/stdout for CLI clients
//! - `HttpTransport` serves streamable HTTP sessions for web clients
//!
//! Both own the shared database client and close it during shutdown, after
//! in-flight requests have drained. A second Ctrl+C (or SIGTERM) during the
//! drain forces an immediate exit.

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;

/// A way of serving the MCP protocol to clients.
pub trait Transport: Send + Sync {
    /// Serve requests until shutdown is requested, then release the
    /// database client.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
