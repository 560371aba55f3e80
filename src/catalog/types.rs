//! Catalog entity model
//!
//! Typed request/response structures for the catalog's REST API. Each entity
//! kind carries its own attribute struct; the wire format uses the catalog's
//! camelCase attribute names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The entity kinds this tool registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// A relational database
    Database,
    /// A table within a database
    Table,
    /// A column within a table
    Column,
    /// A lineage process connecting two tables
    Lineage,
}

impl EntityType {
    /// Type name as registered in the catalog's type system
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Database => "hive_db",
            Self::Table => "hive_table",
            Self::Column => "hive_column",
            Self::Lineage => "Process",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Reference to another entity by guid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectId {
    /// Target entity guid
    pub guid: String,
}

impl ObjectId {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// Attributes for a Database entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseAttributes {
    pub name: String,
    pub qualified_name: String,
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Attributes for a Table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAttributes {
    pub name: String,
    pub qualified_name: String,
    /// Owning database reference
    pub db: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Attributes for a Column entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAttributes {
    pub name: String,
    pub qualified_name: String,
    /// Declared data type
    #[serde(rename = "type")]
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    /// 1-based ordinal position within the table
    pub position: usize,
    /// Owning table reference
    pub table: ObjectId,
}

/// Attributes for a lineage process entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageAttributes {
    pub name: String,
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Upstream side of the edge (the referencing table)
    pub inputs: Vec<ObjectId>,
    /// Downstream side of the edge (the referenced table)
    pub outputs: Vec<ObjectId>,
}

/// A complete entity definition ready for transmission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDef {
    pub type_name: &'static str,
    pub attributes: Value,
    #[serde(skip)]
    pub qualified_name: String,
}

impl EntityDef {
    fn build<A: Serialize>(
        entity_type: EntityType,
        name: &str,
        qualified_name: &str,
        attributes: &A,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::catalog_write("entity name must not be empty"));
        }
        if qualified_name.is_empty() {
            return Err(Error::catalog_write(
                "entity qualified name must not be empty",
            ));
        }
        Ok(Self {
            type_name: entity_type.type_name(),
            attributes: serde_json::to_value(attributes)?,
            qualified_name: qualified_name.to_string(),
        })
    }

    /// Validate and wrap database attributes
    pub fn database(attrs: &DatabaseAttributes) -> Result<Self> {
        Self::build(EntityType::Database, &attrs.name, &attrs.qualified_name, attrs)
    }

    /// Validate and wrap table attributes
    pub fn table(attrs: &TableAttributes) -> Result<Self> {
        Self::build(EntityType::Table, &attrs.name, &attrs.qualified_name, attrs)
    }

    /// Validate and wrap column attributes
    pub fn column(attrs: &ColumnAttributes) -> Result<Self> {
        Self::build(EntityType::Column, &attrs.name, &attrs.qualified_name, attrs)
    }

    /// Validate and wrap lineage attributes
    pub fn lineage(attrs: &LineageAttributes) -> Result<Self> {
        if attrs.inputs.is_empty() || attrs.outputs.is_empty() {
            return Err(Error::catalog_write(
                "lineage requires at least one input and one output",
            ));
        }
        Self::build(EntityType::Lineage, &attrs.name, &attrs.qualified_name, attrs)
    }

    /// The entity's own type
    pub fn entity_type(&self) -> &'static str {
        self.type_name
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Entity summary as returned by basic search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    pub guid: String,
    pub type_name: String,
    /// Display name of the entity
    #[serde(default)]
    pub display_text: Option<String>,
    /// Flattened attribute map (search results carry a subset)
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EntityHeader {
    /// Qualified name attribute if the search result carried it
    pub fn qualified_name(&self) -> Option<&str> {
        self.attributes.get("qualifiedName").and_then(Value::as_str)
    }

    /// Display name, falling back to the name attribute
    pub fn name(&self) -> &str {
        self.display_text
            .as_deref()
            .or_else(|| self.attributes.get("name").and_then(Value::as_str))
            .unwrap_or("")
    }
}

/// Basic search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub entities: Vec<EntityHeader>,
}

/// Full entity record as returned by get-by-guid and get-by-qualified-name
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRecord {
    pub entity: EntityBody,
}

/// The entity payload inside an [`EntityRecord`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBody {
    pub guid: String,
    pub type_name: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EntityBody {
    /// String attribute accessor
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Guid list from an object-id array attribute (e.g. lineage inputs)
    pub fn attr_object_ids(&self, key: &str) -> Vec<String> {
        self.attributes
            .get(key)
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("guid").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Create-entity response: the catalog echoes assigned guids
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    #[serde(default)]
    pub guid_assignments: HashMap<String, String>,
    #[serde(default)]
    pub mutated_entities: HashMap<String, Vec<EntityHeader>>,
}

impl MutationResult {
    /// Resolve the guid of the entity created for `qualified_name`.
    ///
    /// Prefers the explicit assignment map, then falls back to the first
    /// CREATE/UPDATE mutation, matching how the catalog reports both fresh
    /// creates and no-op updates.
    pub fn assigned_guid(&self, qualified_name: &str) -> Option<String> {
        if let Some(guid) = self.guid_assignments.get(qualified_name) {
            return Some(guid.clone());
        }
        for key in ["CREATE", "UPDATE"] {
            if let Some(entities) = self.mutated_entities.get(key) {
                if let Some(first) = entities.first() {
                    return Some(first.guid.clone());
                }
            }
        }
        None
    }
}

/// Lineage graph for one entity
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageGraph {
    /// Guid the graph is centered on
    #[serde(default)]
    pub base_entity_guid: String,
    #[serde(default)]
    pub relations: Vec<LineageRelation>,
    /// Entity headers for every guid appearing in `relations`
    #[serde(default)]
    pub guid_entity_map: HashMap<String, EntityHeader>,
}

/// One edge in a lineage graph
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRelation {
    pub from_entity_id: String,
    pub to_entity_id: String,
}

#[cfg(test)]
mod type_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entity_type_names() {
        assert_eq!(EntityType::Database.type_name(), "hive_db");
        assert_eq!(EntityType::Table.type_name(), "hive_table");
        assert_eq!(EntityType::Column.type_name(), "hive_column");
        assert_eq!(EntityType::Lineage.type_name(), "Process");
    }

    #[test]
    fn test_column_wire_format() {
        let attrs = ColumnAttributes {
            name: "customer_id".to_string(),
            qualified_name: "northwind.public.orders.customer_id@primary".to_string(),
            data_type: "integer".to_string(),
            is_nullable: true,
            is_primary_key: false,
            position: 2,
            table: ObjectId::new("t-1"),
        };
        let def = EntityDef::column(&attrs).unwrap();
        assert_eq!(def.type_name, "hive_column");
        assert_eq!(def.attributes["qualifiedName"], attrs.qualified_name);
        assert_eq!(def.attributes["type"], "integer");
        assert_eq!(def.attributes["isPrimaryKey"], false);
        assert_eq!(def.attributes["table"]["guid"], "t-1");
    }

    #[test]
    fn test_empty_name_rejected() {
        let attrs = DatabaseAttributes {
            name: String::new(),
            qualified_name: "db@primary".to_string(),
            cluster_name: "primary".to_string(),
            description: None,
        };
        assert!(EntityDef::database(&attrs).is_err());
    }

    #[test]
    fn test_lineage_requires_endpoints() {
        let attrs = LineageAttributes {
            name: "orders_to_customers".to_string(),
            qualified_name: "lineage.northwind.orders_to_customers@primary".to_string(),
            description: None,
            inputs: vec![],
            outputs: vec![ObjectId::new("t-2")],
        };
        assert!(EntityDef::lineage(&attrs).is_err());
    }

    #[test]
    fn test_mutation_result_guid_resolution() {
        let result: MutationResult = serde_json::from_value(json!({
            "guidAssignments": {"northwind.public@primary": "g-1"},
            "mutatedEntities": {}
        }))
        .unwrap();
        assert_eq!(
            result.assigned_guid("northwind.public@primary").as_deref(),
            Some("g-1")
        );

        let result: MutationResult = serde_json::from_value(json!({
            "mutatedEntities": {
                "CREATE": [{"guid": "g-2", "typeName": "hive_table"}]
            }
        }))
        .unwrap();
        assert_eq!(result.assigned_guid("anything").as_deref(), Some("g-2"));
    }

    #[test]
    fn test_entity_body_object_ids() {
        let body: EntityBody = serde_json::from_value(json!({
            "guid": "p-1",
            "typeName": "Process",
            "attributes": {
                "inputs": [{"guid": "t-1"}],
                "outputs": [{"guid": "t-2"}]
            }
        }))
        .unwrap();
        assert_eq!(body.attr_object_ids("inputs"), vec!["t-1".to_string()]);
        assert_eq!(body.attr_object_ids("outputs"), vec!["t-2".to_string()]);
        assert!(body.attr_object_ids("missing").is_empty());
    }
}
