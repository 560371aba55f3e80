//! Catalog REST client
//!
//! Thin wrapper over the catalog's v2 HTTP API: basic search, entity create,
//! get-by-guid, get-by-qualified-name, and lineage. Every request carries
//! HTTP Basic credentials; a connection-level failure maps to
//! [`Error::CatalogUnavailable`] and surfaces immediately (no retries).

use super::types::{
    EntityBody, EntityDef, EntityHeader, EntityRecord, EntityType, LineageGraph, MutationResult,
    SearchResult,
};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Client for the metadata catalog service
pub struct CatalogClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl CatalogClient {
    /// Create a client from catalog configuration
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("atlas-bridge/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL the client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }

    async fn send_get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let req = self
            .client
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .query(query);

        req.send().await.map_err(|e| Self::transport_error(&e, e.to_string()))
    }

    async fn send_post(&self, path: &str, body: &Value) -> Result<Response> {
        self.client
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e, e.to_string()))
    }

    fn transport_error(e: &reqwest::Error, message: String) -> Error {
        if e.is_connect() || e.is_timeout() {
            Error::catalog_unavailable(message)
        } else {
            Error::catalog_unavailable(format!("request failed: {message}"))
        }
    }

    /// Read the response body for an error message, best effort
    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fetch the catalog's version record. Used as a connectivity probe.
    pub async fn get_version(&self) -> Result<Value> {
        let response = self.send_get("api/atlas/admin/version", &[]).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::catalog_unavailable(format!(
                "version probe returned HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }
        Ok(response.json().await?)
    }

    /// Search entities of one type by free-text query.
    ///
    /// Returns an empty list when nothing matches.
    pub async fn search_entities(
        &self,
        entity_type: EntityType,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EntityHeader>> {
        let response = self
            .send_get(
                "api/atlas/v2/search/basic",
                &[
                    ("query", query.to_string()),
                    ("typeName", entity_type.type_name().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                let result: SearchResult = response.json().await?;
                debug!(
                    "Search {} '{}': {} entities",
                    entity_type,
                    query,
                    result.entities.len()
                );
                Ok(result.entities)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::catalog_unavailable(
                format!("authentication rejected (HTTP {})", status.as_u16()),
            )),
            s if s.is_client_error() => Err(Error::catalog_query(format!(
                "HTTP {}: {}",
                s.as_u16(),
                Self::error_body(response).await
            ))),
            s => Err(Error::catalog_unavailable(format!(
                "HTTP {}: {}",
                s.as_u16(),
                Self::error_body(response).await
            ))),
        }
    }

    /// Create (or update, by qualified name) an entity and return its guid.
    ///
    /// The client does not deduplicate; use [`Self::find_or_create`] for the
    /// idempotent path.
    pub async fn create_entity(&self, def: &EntityDef) -> Result<String> {
        let body = json!({ "entity": def });
        let response = self.send_post("api/atlas/v2/entity", &body).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::catalog_unavailable(format!(
                "authentication rejected (HTTP {})",
                status.as_u16()
            )));
        }
        if status.is_client_error() {
            return Err(Error::catalog_write(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }
        if !status.is_success() {
            return Err(Error::catalog_unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }

        let result: MutationResult = response.json().await?;
        let guid = result.assigned_guid(&def.qualified_name).ok_or_else(|| {
            Error::catalog_write(format!(
                "catalog did not assign a guid for '{}'",
                def.qualified_name
            ))
        })?;

        info!("Created {} '{}' (guid {guid})", def.type_name, def.qualified_name);
        Ok(guid)
    }

    /// Fetch a full entity record by guid
    pub async fn get_entity(&self, guid: &str) -> Result<EntityBody> {
        let response = self
            .send_get(&format!("api/atlas/v2/entity/guid/{guid}"), &[])
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::entity_not_found(guid));
        }
        if !status.is_success() {
            return Err(Error::catalog_unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }

        let record: EntityRecord = response.json().await?;
        Ok(record.entity)
    }

    /// Fetch an entity by its unique qualified name.
    ///
    /// Returns `None` when no entity carries that qualified name.
    pub async fn get_entity_by_qualified_name(
        &self,
        entity_type: EntityType,
        qualified_name: &str,
    ) -> Result<Option<EntityBody>> {
        let path = format!(
            "api/atlas/v2/entity/uniqueAttribute/type/{}",
            entity_type.type_name()
        );
        let response = self
            .send_get(&path, &[("attr:qualifiedName", qualified_name.to_string())])
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::catalog_unavailable(format!(
                "authentication rejected (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(Error::catalog_query(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }

        let record: EntityRecord = response.json().await?;
        Ok(Some(record.entity))
    }

    /// Fetch the lineage graph around one entity
    pub async fn get_lineage(&self, guid: &str) -> Result<LineageGraph> {
        let response = self
            .send_get(
                &format!("api/atlas/v2/lineage/{guid}"),
                &[
                    ("depth", "3".to_string()),
                    ("direction", "BOTH".to_string()),
                ],
            )
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::entity_not_found(guid));
        }
        if !status.is_success() {
            return Err(Error::catalog_unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::error_body(response).await
            )));
        }

        Ok(response.json().await?)
    }

    /// Look an entity up by qualified name, creating it when absent.
    ///
    /// Returns the guid and whether the entity was newly created. This is the
    /// single idempotent write path; rerunning against an unchanged schema
    /// resolves every entity through the lookup branch.
    pub async fn find_or_create(
        &self,
        entity_type: EntityType,
        def: &EntityDef,
    ) -> Result<(String, bool)> {
        if let Some(existing) = self
            .get_entity_by_qualified_name(entity_type, &def.qualified_name)
            .await?
        {
            debug!(
                "{} '{}' already cataloged (guid {})",
                def.type_name, def.qualified_name, existing.guid
            );
            return Ok((existing.guid, false));
        }

        let guid = self.create_entity(def).await?;
        Ok((guid, true))
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
