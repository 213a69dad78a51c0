//! Database access layer.
//!
//! The layer is split into a connection client, a query runner, a catalog
//! reader, and value decoding. Database-specific code lives in parallel
//! submodules inside each file so the per-dialect differences stay obvious.

pub mod catalog;
pub mod client;
pub mod exec;
pub mod value;

pub use client::{DbClient, DbPool};
pub use exec::QueryRunner;
pub use value::{TypeCategory, categorize_type};
