//! Catalog metadata models returned by the schema tools.

use schemars::JsonSchema;
use serde::Serialize;

/// A column of a table, in declaration order.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Declared column type as the database reports it
    pub column_type: String,
    /// Column comment; empty string when the database has none
    pub comment: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// A table together with its comment and columns.
///
/// Comments are always present as strings; a missing comment is the empty
/// string, never null, so clients can render them without null checks.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Table comment; empty string when the database has none
    pub comment: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
    /// DDL that created the table, when the database exposes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_table_query: Option<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            columns: Vec::new(),
            create_table_query: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_comments_serialize_as_empty_strings() {
        let table = TableDescriptor {
            name: "users".to_string(),
            comment: String::new(),
            columns: vec![ColumnDescriptor::new("id", "INTEGER")],
            create_table_query: None,
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["comment"], "");
        assert_eq!(json["columns"][0]["comment"], "");
        assert!(json.get("create_table_query").is_none());
    }

    #[test]
    fn test_comments_pass_through() {
        let table = TableDescriptor::new("test_table")
            .with_comment("Test table for unit testing");
        assert_eq!(table.comment, "Test table for unit testing");

        let col = ColumnDescriptor::new("id", "UInt32").with_comment("Primary identifier");
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["comment"], "Primary identifier");
        assert_eq!(json["column_type"], "UInt32");
    }
}
