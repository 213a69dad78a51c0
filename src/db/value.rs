//! Row value decoding.
//!
//! Conversion is two-phase: `TypeCategory` classifies the declared column
//! type, then database-specific decoders extract a `CellValue`. Every decoded
//! value lands in the closed `CellValue` set, so downstream serialization
//! (JSON responses, CSV export) has no open-ended cases.

use crate::models::{CellValue, DatabaseType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    DateTime,
    Date,
    Time,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric first, "numeric" overlaps with float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC affinity is a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    // Timestamp before time, "timestamp" contains "time"
    if lower.contains("timestamp") || lower.contains("datetime") {
        return TypeCategory::DateTime;
    }

    if lower == "date" {
        return TypeCategory::Date;
    }

    if lower == "time" || lower == "timetz" {
        return TypeCategory::Time;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "string" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// Encode binary data as a string cell: UTF-8 when valid, base64 otherwise.
pub fn binary_to_cell(bytes: &[u8]) -> CellValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => CellValue::Text(s.to_string()),
        Err(_) => CellValue::Text(STANDARD.encode(bytes)),
    }
}

/// Trait for decoding database rows into cell values.
pub trait RowDecode {
    fn column_names(&self) -> Vec<String>;
    fn cell_values(&self) -> Vec<CellValue>;
}

impl RowDecode for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn cell_values(&self) -> Vec<CellValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::MySQL);
                mysql::decode_column(self, idx, category)
            })
            .collect()
    }
}

impl RowDecode for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn cell_values(&self) -> Vec<CellValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::PostgreSQL);
                postgres::decode_column(self, idx, category)
            })
            .collect()
    }
}

impl RowDecode for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn cell_values(&self) -> Vec<CellValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::SQLite);
                sqlite::decode_column(self, idx, category)
            })
            .collect()
    }
}

// Each module below provides the same decoders adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> CellValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::DateTime => decode_datetime(row, idx),
            TypeCategory::Date => decode_date(row, idx),
            TypeCategory::Time => decode_time(row, idx),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> CellValue {
        // Decimals stay as strings to preserve the exact representation
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Int(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
            return CellValue::UInt(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return CellValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
            return CellValue::UInt(v as u64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return CellValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
            return CellValue::UInt(v as u64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
            return CellValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
            return CellValue::UInt(v as u64);
        }
        CellValue::Null
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return CellValue::Float(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return CellValue::Float(v as f64);
        }
        CellValue::Null
    }

    fn decode_binary(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| binary_to_cell(&v))
            .unwrap_or(CellValue::Null)
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .map(|v| CellValue::Text(v.to_string()))
            .unwrap_or(CellValue::Null)
    }

    fn decode_datetime(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(Some(v)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return CellValue::DateTime(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return CellValue::DateTime(v.and_utc());
        }
        CellValue::Null
    }

    fn decode_date(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null)
    }

    fn decode_time(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<NaiveTime>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Time)
            .unwrap_or(CellValue::Null)
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> CellValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> CellValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::DateTime => decode_datetime(row, idx),
            TypeCategory::Date => decode_date(row, idx),
            TypeCategory::Time => decode_time(row, idx),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }

    fn decode_integer(row: &PgRow, idx: usize) -> CellValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return CellValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return CellValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Int(v);
        }
        CellValue::Null
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null)
    }

    fn decode_float(row: &PgRow, idx: usize) -> CellValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return CellValue::Float(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return CellValue::Float(v as f64);
        }
        CellValue::Null
    }

    fn decode_binary(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| binary_to_cell(&v))
            .unwrap_or(CellValue::Null)
    }

    fn decode_json(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .map(|v| CellValue::Text(v.to_string()))
            .unwrap_or(CellValue::Null)
    }

    fn decode_datetime(row: &PgRow, idx: usize) -> CellValue {
        if let Ok(Some(v)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return CellValue::DateTime(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return CellValue::DateTime(v.and_utc());
        }
        CellValue::Null
    }

    fn decode_date(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null)
    }

    fn decode_time(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<NaiveTime>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Time)
            .unwrap_or(CellValue::Null)
    }

    fn decode_text(row: &PgRow, idx: usize) -> CellValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> CellValue {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float | TypeCategory::Decimal => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            // SQLite columns are dynamically typed and expression columns
            // (literals, aggregates) carry no declared type at all, so the
            // remaining categories decode from the value's storage class.
            // Temporal values are stored as TEXT and come back as Text.
            _ => decode_dynamic(row, idx),
        }
    }

    fn decode_dynamic(row: &SqliteRow, idx: usize) -> CellValue {
        match row.try_get::<Option<i64>, _>(idx) {
            Ok(Some(v)) => return CellValue::Int(v),
            Ok(None) => return CellValue::Null,
            Err(_) => {}
        }
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return CellValue::Float(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
            return CellValue::Text(v);
        }
        decode_binary(row, idx)
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> CellValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return CellValue::Int(v);
        }
        CellValue::Null
    }

    fn decode_boolean(row: &SqliteRow, idx: usize) -> CellValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null)
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> CellValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return CellValue::Float(v);
        }
        CellValue::Null
    }

    fn decode_binary(row: &SqliteRow, idx: usize) -> CellValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| binary_to_cell(&v))
            .unwrap_or(CellValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("SERIAL", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC affinity is a float
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("DATETIME", DatabaseType::MySQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("DATE", DatabaseType::MySQL),
            TypeCategory::Date
        );
        assert_eq!(
            categorize_type("TIME", DatabaseType::PostgreSQL),
            TypeCategory::Time
        );
    }

    #[test]
    fn test_categorize_type_text() {
        assert_eq!(
            categorize_type("VARCHAR", DatabaseType::MySQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("TEXT", DatabaseType::SQLite),
            TypeCategory::Text
        );
    }

    #[test]
    fn test_binary_to_cell() {
        assert_eq!(
            binary_to_cell(b"hello world"),
            CellValue::Text("hello world".to_string())
        );
        let bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        assert_eq!(binary_to_cell(bytes), CellValue::Text("//4AAQ==".to_string()));
    }
}
