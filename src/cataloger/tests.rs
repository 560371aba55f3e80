//! Tests for the cataloging pass
//!
//! The catalog side is a wiremock server; the schema side is an in-memory
//! fake. Create responses echo a guid derived from the qualified name so the
//! pass stays deterministic without server-side state.

use super::*;
use crate::catalog::CatalogClient;
use crate::config::{CatalogConfig, SourceConfig};
use crate::source::{ColumnInfo, ForeignKey, SchemaSource};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct FakeSource {
    tables: Vec<String>,
    columns: HashMap<String, Vec<ColumnInfo>>,
    primary_keys: HashMap<String, BTreeSet<String>>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaSource for FakeSource {
    fn list_tables(&self) -> crate::error::Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    fn get_columns(&self, table: &str) -> crate::error::Result<Vec<ColumnInfo>> {
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    fn get_primary_key(&self, table: &str) -> crate::error::Result<BTreeSet<String>> {
        Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
    }

    fn get_foreign_keys(&self) -> crate::error::Result<Vec<ForeignKey>> {
        Ok(self.foreign_keys.clone())
    }
}

fn column(name: &str, data_type: &str, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
    }
}

/// Two-table fixture: orders(id, customer_id) -> customers(id)
fn orders_customers() -> FakeSource {
    let mut source = FakeSource {
        tables: vec!["customers".to_string(), "orders".to_string()],
        ..FakeSource::default()
    };
    source.columns.insert(
        "customers".to_string(),
        vec![column("id", "integer", false)],
    );
    source.columns.insert(
        "orders".to_string(),
        vec![
            column("id", "integer", false),
            column("customer_id", "integer", true),
        ],
    );
    source
        .primary_keys
        .insert("customers".to_string(), BTreeSet::from(["id".to_string()]));
    source
        .primary_keys
        .insert("orders".to_string(), BTreeSet::from(["id".to_string()]));
    source.foreign_keys.push(ForeignKey {
        from_table: "orders".to_string(),
        from_column: "customer_id".to_string(),
        to_table: "customers".to_string(),
        to_column: "id".to_string(),
    });
    source
}

fn client_for(server: &MockServer) -> CatalogClient {
    let config = CatalogConfig {
        url: server.uri(),
        username: "admin".to_string(),
        password: "admin".to_string(),
        cluster: "primary".to_string(),
        timeout_secs: 5,
    };
    CatalogClient::new(&config).unwrap()
}

fn source_config() -> SourceConfig {
    SourceConfig {
        database: "northwind".to_string(),
        schema: "public".to_string(),
        ..SourceConfig::default()
    }
}

/// Create responder deriving the guid from the submitted qualified name
struct EchoCreate;

impl Respond for EchoCreate {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let qn = body["entity"]["attributes"]["qualifiedName"]
            .as_str()
            .unwrap()
            .to_string();
        ResponseTemplate::new(200).set_body_json(json!({
            "guidAssignments": { (qn.clone()): format!("guid-{qn}") }
        }))
    }
}

/// Lookup responder that resolves every qualified name to an existing entity
struct EchoLookup;

impl Respond for EchoLookup {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let qn = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "attr:qualifiedName")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({
            "entity": {
                "guid": format!("guid-{qn}"),
                "typeName": "hive_table",
                "attributes": { "qualifiedName": qn }
            }
        }))
    }
}

async fn mount_fresh_catalog(server: &MockServer) {
    // Every lookup misses, every create succeeds
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(
            r"^/api/atlas/v2/entity/uniqueAttribute/type/.*$",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/atlas/v2/entity"))
        .respond_with(EchoCreate)
        .mount(server)
        .await;
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_orders_customers_scenario() {
    let server = MockServer::start().await;
    mount_fresh_catalog(&server).await;

    let client = client_for(&server);
    let source = orders_customers();
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");

    let summary = cataloger.catalog_all_tables().await.unwrap();

    assert_eq!(summary.tables_created, 2);
    assert_eq!(summary.columns_created, 3);
    assert_eq!(summary.relationships_created, 1);
    assert!(summary.warnings.is_empty());

    // The lineage process must reference the two table guids
    let requests = server.received_requests().await.unwrap();
    let lineage_body: Value = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .find(|b| b["entity"]["typeName"] == "Process")
        .expect("no lineage process was created");

    let attrs = &lineage_body["entity"]["attributes"];
    assert_eq!(attrs["name"], "orders_to_customers");
    assert_eq!(
        attrs["inputs"][0]["guid"],
        "guid-northwind.public.orders@primary"
    );
    assert_eq!(
        attrs["outputs"][0]["guid"],
        "guid-northwind.public.customers@primary"
    );
}

#[tokio::test]
async fn test_primary_key_flags_follow_pk_set() {
    let server = MockServer::start().await;
    mount_fresh_catalog(&server).await;

    let client = client_for(&server);
    let source = orders_customers();
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");
    cataloger.catalog_all_tables().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let columns: Vec<Value> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .filter(|b| b["entity"]["typeName"] == "hive_column")
        .collect();

    assert_eq!(columns.len(), 3);
    for body in &columns {
        let attrs = &body["entity"]["attributes"];
        let is_pk = attrs["name"] == "id";
        assert_eq!(attrs["isPrimaryKey"], is_pk, "attrs: {attrs}");
    }
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;

    // Every lookup hits; no POST mock is mounted, so any create attempt
    // comes back as an unexpected 404 and would surface as a warning.
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(
            r"^/api/atlas/v2/entity/uniqueAttribute/type/.*$",
        ))
        .respond_with(EchoLookup)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let source = orders_customers();
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");

    let summary = cataloger.catalog_all_tables().await.unwrap();

    assert_eq!(summary.tables_created, 0);
    assert_eq!(summary.columns_created, 0);
    assert_eq!(summary.relationships_created, 0);
    assert!(summary.warnings.is_empty(), "{:?}", summary.warnings);
}

#[tokio::test]
async fn test_unresolved_lineage_endpoint_is_warning() {
    let server = MockServer::start().await;
    mount_fresh_catalog(&server).await;

    let mut source = orders_customers();
    // FK points at a table the extractor never listed
    source.foreign_keys.push(ForeignKey {
        from_table: "orders".to_string(),
        from_column: "region_id".to_string(),
        to_table: "regions".to_string(),
        to_column: "id".to_string(),
    });

    let client = client_for(&server);
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");
    let summary = cataloger.catalog_all_tables().await.unwrap();

    assert_eq!(summary.relationships_created, 1);
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("unresolved lineage"));
    assert!(summary.warnings[0].contains("regions"));
}

#[tokio::test]
async fn test_no_foreign_keys_means_no_relationships_no_warnings() {
    let server = MockServer::start().await;
    mount_fresh_catalog(&server).await;

    let mut source = FakeSource {
        tables: vec!["settings".to_string()],
        ..FakeSource::default()
    };
    source.columns.insert(
        "settings".to_string(),
        vec![column("key", "text", false), column("value", "text", true)],
    );

    let client = client_for(&server);
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");
    let summary = cataloger.catalog_all_tables().await.unwrap();

    assert_eq!(summary.tables_created, 1);
    assert_eq!(summary.columns_created, 2);
    assert_eq!(summary.relationships_created, 0);
    assert!(summary.warnings.is_empty());
}

#[tokio::test]
async fn test_rejected_table_is_recovered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(
            r"^/api/atlas/v2/entity/uniqueAttribute/type/.*$",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // Reject anything mentioning 'orders'; accept the rest
    struct RejectOrders;
    impl Respond for RejectOrders {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let qn = body["entity"]["attributes"]["qualifiedName"]
                .as_str()
                .unwrap()
                .to_string();
            if qn.contains("orders") {
                ResponseTemplate::new(400).set_body_string("rejected")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "guidAssignments": { (qn.clone()): format!("guid-{qn}") }
                }))
            }
        }
    }

    Mock::given(method("POST"))
        .and(path("/api/atlas/v2/entity"))
        .respond_with(RejectOrders)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let source = orders_customers();
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");
    let summary = cataloger.catalog_all_tables().await.unwrap();

    // customers still lands; orders is skipped, and so is the lineage edge
    // that depends on it
    assert_eq!(summary.tables_created, 1);
    assert_eq!(summary.columns_created, 1);
    assert_eq!(summary.relationships_created, 0);
    assert!(!summary.warnings.is_empty());
}

#[tokio::test]
async fn test_unreachable_catalog_is_fatal() {
    let config = CatalogConfig {
        url: "http://127.0.0.1:1".to_string(),
        username: "admin".to_string(),
        password: "admin".to_string(),
        cluster: "primary".to_string(),
        timeout_secs: 2,
    };
    let client = CatalogClient::new(&config).unwrap();
    let source = orders_customers();
    let cataloger = Cataloger::new(&client, &source, &source_config(), "primary");

    let err = cataloger.catalog_all_tables().await.unwrap_err();
    assert!(err.is_fatal());
}
