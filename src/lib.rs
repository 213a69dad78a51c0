//! Query MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to run read-oriented operations against SQL databases (SQLite, PostgreSQL,
//! MySQL): list databases, list tables with metadata, run SELECT queries, and
//! export query results to CSV or JSON files.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::DbClient;
pub use error::DbError;
pub use mcp::QueryService;
