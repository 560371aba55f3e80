//! Relational source introspection
//!
//! Read-only extraction of schema metadata (tables, columns, primary keys,
//! foreign keys) from the configured PostgreSQL database.

mod extractor;
mod types;


pub use extractor::PostgresExtractor;
pub use types::{ColumnInfo, ForeignKey, SchemaSource};
