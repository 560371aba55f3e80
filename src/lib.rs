// Allow common clippy pedantic lints
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # atlas-bridge
//!
//! Connects a PostgreSQL database to an Apache-Atlas-style metadata catalog:
//! schema metadata is extracted from the source, registered as catalog
//! entities (database, tables, columns), foreign keys become table-level
//! lineage relationships, and a discovery report is written in JSON and CSV.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atlas_bridge::catalog::CatalogClient;
//! use atlas_bridge::cataloger::Cataloger;
//! use atlas_bridge::config::AppConfig;
//! use atlas_bridge::source::PostgresExtractor;
//!
//! #[tokio::main]
//! async fn main() -> atlas_bridge::Result<()> {
//!     let config = AppConfig::from_file("config.yaml")?;
//!     let client = CatalogClient::new(&config.catalog)?;
//!     let extractor = PostgresExtractor::connect(&config.source)?;
//!
//!     let cataloger = Cataloger::new(&client, &extractor, &config.source, &config.catalog.cluster);
//!     let summary = cataloger.catalog_all_tables().await?;
//!     println!("{} tables cataloged", summary.tables_created);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PostgresExtractor ──> Cataloger ──> CatalogClient ──> catalog service
//!                                          │
//!                       ReportGenerator <──┘ (read-back)
//!                              │
//!                     {base}.json, {base}_tables.csv, {base}_relationships.csv
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Typed configuration
pub mod config;

/// Metadata catalog client
pub mod catalog;

/// Relational source introspection
pub mod source;

/// Cataloging pass
pub mod cataloger;

/// Discovery report generation
pub mod report;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
