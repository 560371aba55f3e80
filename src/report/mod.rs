//! Discovery report generation
//!
//! Reads the cataloged entities back through the catalog client, computes
//! summary statistics, and writes one JSON document plus two CSV listings
//! (tables and relationships) under a caller-supplied base name.


use crate::catalog::{CatalogClient, EntityType};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SEARCH_LIMIT: usize = 1000;
const COLUMN_SEARCH_LIMIT: usize = 5000;

/// Paths of the files written by one report run
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub json: PathBuf,
    pub tables_csv: PathBuf,
    pub relationships_csv: PathBuf,
}

/// Full report document
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub tables: Vec<TableReport>,
    pub table_with_most_columns: Option<TableReport>,
    pub relationships: Vec<RelationshipReport>,
}

/// Report provenance
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub catalog_url: String,
}

/// Aggregate counts
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_databases: usize,
    pub total_tables: usize,
    pub total_columns: usize,
    pub total_relationships: usize,
    pub average_columns_per_table: f64,
}

/// One table row
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub name: String,
    pub qualified_name: String,
    pub database: String,
    pub column_count: usize,
}

/// One lineage edge row
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipReport {
    pub source_table: String,
    pub target_table: String,
}

/// Builds and writes discovery reports from catalog state
pub struct ReportGenerator<'a> {
    client: &'a CatalogClient,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(client: &'a CatalogClient) -> Self {
        Self { client }
    }

    /// Collect statistics and write all three output files.
    ///
    /// A write failure is fatal for this step only; catalog state is
    /// untouched either way.
    pub async fn generate_report(&self, base_name: &str) -> Result<ReportFiles> {
        let report = self.collect().await?;

        let files = ReportFiles {
            json: PathBuf::from(format!("{base_name}.json")),
            tables_csv: PathBuf::from(format!("{base_name}_tables.csv")),
            relationships_csv: PathBuf::from(format!("{base_name}_relationships.csv")),
        };

        let json = serde_json::to_string_pretty(&report)?;
        write_file(&files.json, &json)?;
        write_file(&files.tables_csv, &tables_csv(&report.tables))?;
        write_file(
            &files.relationships_csv,
            &relationships_csv(&report.relationships),
        )?;

        info!(
            "Report written: {}, {}, {}",
            files.json.display(),
            files.tables_csv.display(),
            files.relationships_csv.display()
        );
        Ok(files)
    }

    /// Query catalog state and compute the report document
    pub async fn collect(&self) -> Result<DiscoveryReport> {
        let databases = self
            .client
            .search_entities(EntityType::Database, "*", SEARCH_LIMIT)
            .await?;
        let table_headers = self
            .client
            .search_entities(EntityType::Table, "*", SEARCH_LIMIT)
            .await?;
        let column_headers = self
            .client
            .search_entities(EntityType::Column, "*", COLUMN_SEARCH_LIMIT)
            .await?;
        let processes = self
            .client
            .search_entities(EntityType::Lineage, "*", SEARCH_LIMIT)
            .await?;

        debug!(
            "Catalog state: {} databases, {} tables, {} columns, {} processes",
            databases.len(),
            table_headers.len(),
            column_headers.len(),
            processes.len()
        );

        // Column entities roll up to their table by qualified-name prefix
        let mut columns_per_table: HashMap<String, usize> = HashMap::new();
        for column in &column_headers {
            let Some(qn) = column.qualified_name() else {
                continue;
            };
            let Some(table_qn) = parent_qualified_name(qn) else {
                continue;
            };
            *columns_per_table.entry(table_qn).or_insert(0) += 1;
        }

        let mut tables = Vec::with_capacity(table_headers.len());
        let mut guid_to_table: HashMap<String, String> = HashMap::new();
        for header in &table_headers {
            let qualified_name = header.qualified_name().unwrap_or_default().to_string();
            let name = header.name().to_string();
            guid_to_table.insert(header.guid.clone(), name.clone());
            tables.push(TableReport {
                database: database_of(&qualified_name).to_string(),
                column_count: columns_per_table.get(&qualified_name).copied().unwrap_or(0),
                name,
                qualified_name,
            });
        }

        // Ties go to the table encountered first in search order
        let table_with_most_columns = tables
            .iter()
            .fold(None::<&TableReport>, |best, t| match best {
                Some(b) if b.column_count >= t.column_count => Some(b),
                _ => Some(t),
            })
            .cloned();

        let mut relationships = Vec::new();
        for process in &processes {
            match self.resolve_relationship(&process.guid, &guid_to_table).await {
                Ok(Some(rel)) => relationships.push(rel),
                Ok(None) => debug!("Process {} has no resolvable endpoints", process.guid),
                Err(e) => warn!("Skipping process {}: {e}", process.guid),
            }
        }

        let total_columns = column_headers.len();
        let average = if tables.is_empty() {
            0.0
        } else {
            let raw = total_columns as f64 / tables.len() as f64;
            (raw * 100.0).round() / 100.0
        };

        Ok(DiscoveryReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                catalog_url: self.client.base_url().to_string(),
            },
            summary: ReportSummary {
                total_databases: databases.len(),
                total_tables: tables.len(),
                total_columns,
                total_relationships: relationships.len(),
                average_columns_per_table: average,
            },
            tables,
            table_with_most_columns,
            relationships,
        })
    }

    /// Resolve one lineage process to a source/target table pair
    async fn resolve_relationship(
        &self,
        guid: &str,
        guid_to_table: &HashMap<String, String>,
    ) -> Result<Option<RelationshipReport>> {
        let body = self.client.get_entity(guid).await?;
        let inputs = body.attr_object_ids("inputs");
        let outputs = body.attr_object_ids("outputs");

        let source = inputs.first().and_then(|g| guid_to_table.get(g));
        let target = outputs.first().and_then(|g| guid_to_table.get(g));

        match (source, target) {
            (Some(source), Some(target)) => Ok(Some(RelationshipReport {
                source_table: source.clone(),
                target_table: target.clone(),
            })),
            _ => Ok(None),
        }
    }
}

/// Qualified name of the owning entity, one level up.
///
/// `db.schema.table.column@cluster` -> `db.schema.table@cluster`
fn parent_qualified_name(qn: &str) -> Option<String> {
    let (path, cluster) = qn.split_once('@')?;
    let (parent, _) = path.rsplit_once('.')?;
    Some(format!("{parent}@{cluster}"))
}

/// First segment of a qualified name, the database part
fn database_of(qn: &str) -> &str {
    qn.split(['.', '@']).next().unwrap_or("")
}

fn tables_csv(tables: &[TableReport]) -> String {
    let mut out = String::from("name,column_count,database\n");
    for table in tables {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&table.name),
            table.column_count,
            csv_field(&table.database)
        ));
    }
    out
}

fn relationships_csv(relationships: &[RelationshipReport]) -> String {
    let mut out = String::from("source_table,target_table\n");
    for rel in relationships {
        out.push_str(&format!(
            "{},{}\n",
            csv_field(&rel.source_table),
            csv_field(&rel.target_table)
        ));
    }
    out
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .map_err(|e| Error::report_write(path.display().to_string(), e.to_string()))
}
