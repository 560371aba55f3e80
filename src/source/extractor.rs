//! PostgreSQL schema extractor
//!
//! Introspects the source through an in-memory DuckDB connection with the
//! `postgres` extension: the source database is attached read-only, table and
//! column listings go through the attached catalog's `information_schema`,
//! and constraint introspection is pushed down to the server with
//! `postgres_query` so the standard constraint joins run natively.

use super::types::{ColumnInfo, ForeignKey, SchemaSource};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use duckdb::{params, Connection};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Schema extractor for a PostgreSQL source
pub struct PostgresExtractor {
    conn: Connection,
    schema: String,
    /// Whether constraint queries can be pushed down to the source
    pushdown: bool,
}

impl PostgresExtractor {
    /// Connect to the source database, read-only
    pub fn connect(config: &SourceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::source_connection(format!("failed to open DuckDB: {e}")))?;

        conn.execute_batch("INSTALL postgres; LOAD postgres;")
            .map_err(|e| {
                Error::source_connection(format!("failed to load postgres extension: {e}"))
            })?;

        let attach_sql = format!(
            "ATTACH '{}' AS source_db (TYPE POSTGRES, READ_ONLY);",
            config.connection_string()
        );
        conn.execute_batch(&attach_sql).map_err(|e| {
            Error::source_connection(format!(
                "failed to attach {}@{}:{}: {e}",
                config.database, config.host, config.port
            ))
        })?;

        info!(
            "Connected to source {}@{}:{} (schema '{}')",
            config.database, config.host, config.port, config.schema
        );

        Ok(Self {
            conn,
            schema: config.schema.clone(),
            pushdown: true,
        })
    }

    /// Probe the attached source with a trivial query
    pub fn check_connection(&self) -> Result<()> {
        self.conn
            .query_row(
                "SELECT count(*) FROM source_db.information_schema.tables",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| Error::source_connection(format!("connection probe failed: {e}")))?;
        Ok(())
    }

    /// Wrap an introspection query for server-side execution
    pub(crate) fn pushdown_query(inner: &str) -> String {
        // Single quotes in the inner statement must be doubled inside the
        // postgres_query string literal.
        let escaped = inner.replace('\'', "''");
        format!("SELECT * FROM postgres_query('source_db', '{escaped}')")
    }

    /// SQL string literal with embedded quotes doubled
    fn sql_literal(value: &str) -> String {
        value.replace('\'', "''")
    }

    pub(crate) fn primary_key_sql(schema: &str, table: &str) -> String {
        format!(
            "SELECT kcu.column_name \
             FROM information_schema.table_constraints AS tc \
             JOIN information_schema.key_column_usage AS kcu \
               ON tc.constraint_name = kcu.constraint_name \
              AND tc.table_schema = kcu.table_schema \
             WHERE tc.constraint_type = 'PRIMARY KEY' \
               AND tc.table_schema = '{}' \
               AND tc.table_name = '{}' \
             ORDER BY kcu.ordinal_position",
            Self::sql_literal(schema),
            Self::sql_literal(table)
        )
    }

    pub(crate) fn foreign_key_sql(schema: &str) -> String {
        format!(
            "SELECT tc.table_name AS source_table, \
                    kcu.column_name AS source_column, \
                    ccu.table_name AS target_table, \
                    ccu.column_name AS target_column \
             FROM information_schema.table_constraints AS tc \
             JOIN information_schema.key_column_usage AS kcu \
               ON tc.constraint_name = kcu.constraint_name \
              AND tc.table_schema = kcu.table_schema \
             JOIN information_schema.constraint_column_usage AS ccu \
               ON ccu.constraint_name = tc.constraint_name \
              AND ccu.table_schema = tc.table_schema \
             WHERE tc.constraint_type = 'FOREIGN KEY' \
               AND tc.table_schema = '{}' \
             ORDER BY tc.table_name, tc.constraint_name",
            Self::sql_literal(schema)
        )
    }
}

impl SchemaSource for PostgresExtractor {
    fn list_tables(&self) -> Result<Vec<String>> {
        let query = "SELECT table_name \
                     FROM source_db.information_schema.tables \
                     WHERE table_schema = ? AND table_type = 'BASE TABLE' \
                     ORDER BY table_name";

        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| Error::schema_query(format!("failed to prepare table listing: {e}")))?;

        let tables = stmt
            .query_map(params![self.schema], |row| row.get::<_, String>(0))
            .map_err(|e| Error::schema_query(format!("failed to list tables: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::schema_query(format!("failed to read table row: {e}")))?;

        debug!("{} tables in schema '{}'", tables.len(), self.schema);
        Ok(tables)
    }

    fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let query = "SELECT column_name, data_type, is_nullable \
                     FROM source_db.information_schema.columns \
                     WHERE table_schema = ? AND table_name = ? \
                     ORDER BY ordinal_position";

        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| Error::schema_query(format!("failed to prepare column listing: {e}")))?;

        let columns = stmt
            .query_map(params![self.schema, table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    nullable: row.get::<_, String>(2)? == "YES",
                })
            })
            .map_err(|e| Error::schema_query(format!("failed to list columns of '{table}': {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::schema_query(format!("failed to read column row: {e}")))?;

        debug!("{} columns in table '{table}'", columns.len());
        Ok(columns)
    }

    fn get_primary_key(&self, table: &str) -> Result<BTreeSet<String>> {
        let inner = Self::primary_key_sql(&self.schema, table);
        let query = if self.pushdown {
            Self::pushdown_query(&inner)
        } else {
            // Fallback path runs the joins through the attached catalog
            inner.replace("information_schema.", "source_db.information_schema.")
        };

        let mut stmt = self.conn.prepare(&query).map_err(|e| {
            Error::schema_query(format!("failed to prepare primary-key query: {e}"))
        })?;

        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| {
                Error::schema_query(format!("failed to read primary key of '{table}': {e}"))
            })?
            .collect::<std::result::Result<BTreeSet<_>, _>>()
            .map_err(|e| Error::schema_query(format!("failed to read primary-key row: {e}")))?;

        Ok(columns)
    }

    fn get_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let inner = Self::foreign_key_sql(&self.schema);
        let query = if self.pushdown {
            Self::pushdown_query(&inner)
        } else {
            inner.replace("information_schema.", "source_db.information_schema.")
        };

        let mut stmt = self.conn.prepare(&query).map_err(|e| {
            Error::schema_query(format!("failed to prepare foreign-key query: {e}"))
        })?;

        let edges = stmt
            .query_map([], |row| {
                Ok(ForeignKey {
                    from_table: row.get(0)?,
                    from_column: row.get(1)?,
                    to_table: row.get(2)?,
                    to_column: row.get(3)?,
                })
            })
            .map_err(|e| Error::schema_query(format!("failed to list foreign keys: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::schema_query(format!("failed to read foreign-key row: {e}")))?;

        debug!("{} foreign-key edges in schema '{}'", edges.len(), self.schema);
        Ok(edges)
    }
}

impl std::fmt::Debug for PostgresExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresExtractor")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl PostgresExtractor {
    /// Extractor over a plain in-memory DuckDB catalog attached as
    /// `source_db`, for exercising the listing queries without a live
    /// PostgreSQL server. Constraint pushdown is unavailable here.
    pub(crate) fn in_memory(schema: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::source_connection(format!("failed to open DuckDB: {e}")))?;
        conn.execute_batch("ATTACH ':memory:' AS source_db;")
            .map_err(|e| Error::source_connection(format!("failed to attach: {e}")))?;
        Ok(Self {
            conn,
            schema: schema.to_string(),
            pushdown: false,
        })
    }

    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::schema_query(e.to_string()))?;
        Ok(())
    }
}
