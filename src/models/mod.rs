//! Data models for the Query MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
pub use query::{CellValue, ExportFormat, ExportSummary, QueryResult};
pub use schema::{ColumnDescriptor, TableDescriptor};
