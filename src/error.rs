//! Error types for atlas-bridge
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Variants follow the external system they originate from: the relational
//! source, the metadata catalog, or the report output path.

use thiserror::Error;

/// The main error type for atlas-bridge
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Relational Source Errors
    // ============================================================================
    #[error("Source database unreachable: {message}")]
    SourceConnection { message: String },

    #[error("Schema introspection failed: {message}")]
    SchemaQuery { message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    #[error("Catalog search rejected: {message}")]
    CatalogQuery { message: String },

    #[error("Catalog rejected entity: {message}")]
    CatalogWrite { message: String },

    #[error("Entity not found: {guid}")]
    EntityNotFound { guid: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ============================================================================
    // Report Errors
    // ============================================================================
    #[error("Failed to write report '{path}': {message}")]
    ReportWrite { path: String, message: String },

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a source connection error
    pub fn source_connection(message: impl Into<String>) -> Self {
        Self::SourceConnection {
            message: message.into(),
        }
    }

    /// Create a schema introspection error
    pub fn schema_query(message: impl Into<String>) -> Self {
        Self::SchemaQuery {
            message: message.into(),
        }
    }

    /// Create a catalog-unavailable error
    pub fn catalog_unavailable(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    /// Create a catalog search error
    pub fn catalog_query(message: impl Into<String>) -> Self {
        Self::CatalogQuery {
            message: message.into(),
        }
    }

    /// Create a catalog write error
    pub fn catalog_write(message: impl Into<String>) -> Self {
        Self::CatalogWrite {
            message: message.into(),
        }
    }

    /// Create an entity-not-found error
    pub fn entity_not_found(guid: impl Into<String>) -> Self {
        Self::EntityNotFound { guid: guid.into() }
    }

    /// Create a report write error
    pub fn report_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReportWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run.
    ///
    /// Per-entity rejections during cataloging are recovered locally; only
    /// connectivity loss to an external system (or a broken config) is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceConnection { .. }
                | Error::SchemaQuery { .. }
                | Error::CatalogUnavailable { .. }
                | Error::Config { .. }
                | Error::InvalidConfigValue { .. }
        )
    }
}

/// Result type alias for atlas-bridge
pub type Result<T> = std::result::Result<T, Error>;
