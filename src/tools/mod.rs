//! MCP tool implementations.
//!
//! This module contains the database tool handlers:
//! - `query`: run SELECT queries with errors reported as data
//! - `schema`: list databases and tables
//! - `export`: save query results to CSV or JSON files

pub mod export;
pub mod query;
pub mod schema;

pub use export::{ExportInput, ExportToolHandler};
pub use query::{QueryInput, QueryResponse, QueryToolHandler};
pub use schema::{ListDatabasesOutput, ListTablesInput, ListTablesOutput, SchemaToolHandler};
