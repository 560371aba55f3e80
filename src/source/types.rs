//! Schema descriptor types and the extraction seam

use crate::error::Result;
use std::collections::BTreeSet;

/// One column as reported by introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared data type
    pub data_type: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
}

/// One foreign-key edge between two tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Table holding the constraint
    pub from_table: String,
    /// Constrained column
    pub from_column: String,
    /// Referenced table
    pub to_table: String,
    /// Referenced column
    pub to_column: String,
}

/// Read-only schema introspection of a relational source.
///
/// The production implementation is [`super::PostgresExtractor`]; tests
/// substitute an in-memory fake.
pub trait SchemaSource {
    /// Ordered table names in the configured schema
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of one table, in ordinal order
    fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Column names forming the table's primary key (empty set if none)
    fn get_primary_key(&self, table: &str) -> Result<BTreeSet<String>>;

    /// All foreign-key edges visible in the schema
    fn get_foreign_keys(&self) -> Result<Vec<ForeignKey>>;
}
