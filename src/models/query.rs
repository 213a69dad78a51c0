//! Query-related data models.
//!
//! The result of a query is a closed set of value kinds (`CellValue`) rather
//! than driver-specific dynamic values, so CSV/JSON export logic has explicit,
//! testable type dispatch at the serialization boundary.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A single decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl CellValue {
    /// Convert to a JSON value, keeping native types (numbers as numbers,
    /// strings as strings). Temporal values render as ISO-8601 strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(v) => JsonValue::Number((*v).into()),
            Self::UInt(v) => JsonValue::Number((*v).into()),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            Self::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => JsonValue::String(t.format("%H:%M:%S").to_string()),
        }
    }

    /// Render as a CSV field. NULL becomes an empty field; quoting and
    /// escaping are left to the CSV writer.
    pub fn to_csv_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }

    /// Get the kind name of this value for debugging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::DateTime(_) | Self::Date(_) | Self::Time(_) => "datetime",
        }
    }

    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Successful result of a SELECT query: ordered column names, ordered row
/// tuples, and the row count.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub row_count: usize,
}

impl QueryResult {
    /// Create a result from columns and rows; the row count is derived.
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        Self {
            column_names,
            rows,
            row_count,
        }
    }

    /// Create an empty result with known columns.
    pub fn empty(column_names: Vec<String>) -> Self {
        Self::new(column_names, Vec::new())
    }

    /// Number of columns in the result.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }
}

/// Recognized export formats for `save_query_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse a format selector. Only "csv" and "json" are recognized;
    /// anything else is the caller's error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Summary returned by `save_query_results` after a successful export.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct ExportSummary {
    /// Always "success"; failures are raised, not returned
    pub status: String,
    /// Format that was written ("csv" or "json")
    pub format: String,
    /// Number of data rows written (header excluded for CSV)
    pub rows_written: usize,
    /// Number of columns in the result set
    pub columns: usize,
}

impl ExportSummary {
    pub fn success(format: ExportFormat, rows_written: usize, columns: usize) -> Self {
        Self {
            status: "success".to_string(),
            format: format.as_str().to_string(),
            rows_written,
            columns,
        }
    }
}
