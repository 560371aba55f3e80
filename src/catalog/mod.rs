//! Metadata catalog client
//!
//! Wraps the catalog's REST API: entity search, create, get-by-id, lineage,
//! and the idempotent find-or-create path used by the cataloger.

mod client;
mod types;


pub use client::CatalogClient;
pub use types::{
    ColumnAttributes, DatabaseAttributes, EntityBody, EntityDef, EntityHeader, EntityType,
    LineageAttributes, LineageGraph, LineageRelation, MutationResult, ObjectId, SearchResult,
    TableAttributes,
};
