//! Cataloging pass
//!
//! Walks the extracted schema and registers it in the catalog: one Database
//! entity, one Table entity per table, one Column entity per column, and one
//! table-level lineage process per foreign-key edge. Every write goes through
//! the client's find-or-create path, so rerunning against an unchanged schema
//! creates nothing new.
//!
//! Cataloging is best-effort: a rejected entity is recorded as a warning and
//! the pass moves on. Only losing the catalog itself aborts the run.

#[cfg(test)]
mod tests;

use crate::catalog::{
    CatalogClient, ColumnAttributes, DatabaseAttributes, EntityDef, EntityType, LineageAttributes,
    ObjectId, TableAttributes,
};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::source::SchemaSource;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Qualified-name builder for one source database
///
/// Names follow the `part.part.part@cluster` convention and are the global
/// deduplication keys in the catalog.
#[derive(Debug, Clone)]
pub struct QualifiedNames {
    database: String,
    schema: String,
    cluster: String,
}

impl QualifiedNames {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            cluster: cluster.into(),
        }
    }

    pub fn database(&self) -> String {
        format!("{}.{}@{}", self.database, self.schema, self.cluster)
    }

    pub fn table(&self, table: &str) -> String {
        format!("{}.{}.{}@{}", self.database, self.schema, table, self.cluster)
    }

    pub fn column(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}.{}.{}@{}",
            self.database, self.schema, table, column, self.cluster
        )
    }

    pub fn lineage(&self, from_table: &str, to_table: &str) -> String {
        format!(
            "lineage.{}.{}_to_{}@{}",
            self.database, from_table, to_table, self.cluster
        )
    }
}

/// Outcome of one cataloging pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSummary {
    /// Net new Table entities
    pub tables_created: usize,
    /// Net new Column entities
    pub columns_created: usize,
    /// Net new lineage relationships
    pub relationships_created: usize,
    /// Recovered per-entity failures and unresolved lineage endpoints
    pub warnings: Vec<String>,
}

/// Orchestrates extraction and registration
pub struct Cataloger<'a, S> {
    client: &'a CatalogClient,
    source: &'a S,
    names: QualifiedNames,
    database: String,
    schema: String,
    cluster: String,
}

impl<'a, S: SchemaSource> Cataloger<'a, S> {
    /// Create a cataloger for one source database
    pub fn new(client: &'a CatalogClient, source: &'a S, config: &SourceConfig, cluster: &str) -> Self {
        Self {
            client,
            source,
            names: QualifiedNames::new(&config.database, &config.schema, cluster),
            database: config.database.clone(),
            schema: config.schema.clone(),
            cluster: cluster.to_string(),
        }
    }

    /// Register the whole schema: database, tables, columns, lineage.
    ///
    /// Fatal only when the catalog is unreachable or schema extraction
    /// itself fails; everything else degrades to warnings in the summary.
    pub async fn catalog_all_tables(&self) -> Result<CatalogSummary> {
        info!(
            "Cataloging '{}' (schema '{}') into cluster '{}'",
            self.database, self.schema, self.cluster
        );

        let db_guid = self.ensure_database().await?;

        let tables = self.source.list_tables()?;
        let foreign_keys = self.source.get_foreign_keys()?;
        info!(
            "{} tables and {} foreign-key edges to catalog",
            tables.len(),
            foreign_keys.len()
        );

        let mut summary = CatalogSummary::default();
        let mut table_guids: HashMap<String, String> = HashMap::new();

        for table in &tables {
            match self.catalog_table(table, &db_guid, &mut summary).await {
                Ok(guid) => {
                    table_guids.insert(table.clone(), guid);
                }
                Err(e) if matches!(e, Error::CatalogUnavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!("Skipping table '{table}': {e}");
                    summary.warnings.push(format!("table '{table}': {e}"));
                }
            }
        }

        for fk in &foreign_keys {
            let (Some(from_guid), Some(to_guid)) =
                (table_guids.get(&fk.from_table), table_guids.get(&fk.to_table))
            else {
                warn!(
                    "Unresolved lineage endpoint for {}.{} -> {}.{}",
                    fk.from_table, fk.from_column, fk.to_table, fk.to_column
                );
                summary.warnings.push(format!(
                    "unresolved lineage: {} -> {}",
                    fk.from_table, fk.to_table
                ));
                continue;
            };

            match self
                .ensure_lineage(&fk.from_table, from_guid, &fk.to_table, to_guid)
                .await
            {
                Ok(created) => summary.relationships_created += usize::from(created),
                Err(e) if matches!(e, Error::CatalogUnavailable { .. }) => return Err(e),
                Err(e) => {
                    warn!("Skipping lineage {} -> {}: {e}", fk.from_table, fk.to_table);
                    summary.warnings.push(format!(
                        "lineage {} -> {}: {e}",
                        fk.from_table, fk.to_table
                    ));
                }
            }
        }

        info!(
            "Cataloging finished: {} tables, {} columns, {} relationships created, {} warnings",
            summary.tables_created,
            summary.columns_created,
            summary.relationships_created,
            summary.warnings.len()
        );

        Ok(summary)
    }

    /// Find or create the Database entity for the configured source
    async fn ensure_database(&self) -> Result<String> {
        let attrs = DatabaseAttributes {
            name: format!("{}_{}", self.database, self.schema),
            qualified_name: self.names.database(),
            cluster_name: self.cluster.clone(),
            description: Some(format!(
                "Database {}, schema {}",
                self.database, self.schema
            )),
        };
        let def = EntityDef::database(&attrs)?;
        let (guid, created) = self.client.find_or_create(EntityType::Database, &def).await?;
        if created {
            info!("Registered database '{}'", attrs.qualified_name);
        }
        Ok(guid)
    }

    /// Catalog one table and its columns, returning the table guid
    async fn catalog_table(
        &self,
        table: &str,
        db_guid: &str,
        summary: &mut CatalogSummary,
    ) -> Result<String> {
        let columns = self.source.get_columns(table)?;
        let primary_key = self.source.get_primary_key(table)?;

        let table_attrs = TableAttributes {
            name: table.to_string(),
            qualified_name: self.names.table(table),
            db: ObjectId::new(db_guid),
            description: Some(format!("Table {} with {} columns", table, columns.len())),
        };
        let def = EntityDef::table(&table_attrs)?;
        let (table_guid, created) = self.client.find_or_create(EntityType::Table, &def).await?;
        summary.tables_created += usize::from(created);

        for (position, column) in columns.iter().enumerate() {
            let column_attrs = ColumnAttributes {
                name: column.name.clone(),
                qualified_name: self.names.column(table, &column.name),
                data_type: column.data_type.clone(),
                is_nullable: column.nullable,
                is_primary_key: primary_key.contains(&column.name),
                position: position + 1,
                table: ObjectId::new(&table_guid),
            };

            let result = EntityDef::column(&column_attrs);
            let created = match result {
                Ok(def) => match self.client.find_or_create(EntityType::Column, &def).await {
                    Ok((_, created)) => created,
                    Err(e) if matches!(e, Error::CatalogUnavailable { .. }) => return Err(e),
                    Err(e) => {
                        warn!("Skipping column '{}.{}': {e}", table, column.name);
                        summary
                            .warnings
                            .push(format!("column '{}.{}': {e}", table, column.name));
                        false
                    }
                },
                Err(e) => {
                    summary
                        .warnings
                        .push(format!("column '{}.{}': {e}", table, column.name));
                    false
                }
            };
            summary.columns_created += usize::from(created);
        }

        Ok(table_guid)
    }

    /// Find or create the lineage process for one foreign-key edge
    async fn ensure_lineage(
        &self,
        from_table: &str,
        from_guid: &str,
        to_table: &str,
        to_guid: &str,
    ) -> Result<bool> {
        let attrs = LineageAttributes {
            name: format!("{from_table}_to_{to_table}"),
            qualified_name: self.names.lineage(from_table, to_table),
            description: Some(format!(
                "Foreign-key dependency from {from_table} to {to_table}"
            )),
            inputs: vec![ObjectId::new(from_guid)],
            outputs: vec![ObjectId::new(to_guid)],
        };
        let def = EntityDef::lineage(&attrs)?;
        let (_, created) = self.client.find_or_create(EntityType::Lineage, &def).await?;
        if created {
            info!("Lineage registered: {from_table} -> {to_table}");
        }
        Ok(created)
    }
}
