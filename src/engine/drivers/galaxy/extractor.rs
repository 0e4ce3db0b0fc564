//! Galaxy metadata extractor.
//!
//! Walks the account's catalog tree via `/v1/metadata`: catalogs, then
//! schemas per catalog, then tables per schema. Table names are flattened
//! to `catalog.schema.table`. The metadata surface does not expose column
//! detail, so tables carry an empty column list.

use async_trait::async_trait;
use futures::future::try_join_all;

use super::GalaxyClient;
use crate::engine::metadata::{ColumnMetadata, TableMetadata};
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::SchemaExtractor;
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

pub struct GalaxyExtractor {
    engine: EngineType,
    timeouts: EngineTimeouts,
}

fn string_array(payload: serde_json::Value) -> Vec<String> {
    payload
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl GalaxyExtractor {
    pub fn new(engine: EngineType, timeouts: EngineTimeouts) -> Self {
        Self { engine, timeouts }
    }

    async fn catalogs(&self, client: &GalaxyClient) -> GatewayResult<Vec<String>> {
        if let Some(catalog) = &client.catalog {
            return Ok(vec![catalog.clone()]);
        }
        let payload = client.get_json("/v1/metadata/catalogs").await?;
        Ok(string_array(payload))
    }

    async fn schemas(&self, client: &GalaxyClient, catalog: &str) -> GatewayResult<Vec<String>> {
        let path = format!("/v1/metadata/catalogs/{}/schemas", urlencoding::encode(catalog));
        let payload = client.get_json(&path).await?;
        Ok(string_array(payload))
    }

    async fn tables(
        &self,
        client: &GalaxyClient,
        catalog: &str,
        schema: &str,
    ) -> GatewayResult<Vec<String>> {
        let path = format!(
            "/v1/metadata/catalogs/{}/schemas/{}/tables",
            urlencoding::encode(catalog),
            urlencoding::encode(schema)
        );
        let payload = client.get_json(&path).await?;
        Ok(string_array(payload))
    }

    /// Walk the catalog tree, fanning out per level and failing fast.
    async fn walk(&self, client: &GalaxyClient) -> GatewayResult<Vec<String>> {
        let catalogs = self.catalogs(client).await?;

        let schema_lists = try_join_all(
            catalogs
                .iter()
                .map(|catalog| async move { self.schemas(client, catalog).await }),
        )
        .await?;

        let mut pairs = Vec::new();
        for (catalog, schemas) in catalogs.iter().zip(schema_lists) {
            for schema in schemas {
                pairs.push((catalog.clone(), schema));
            }
        }

        let table_lists = try_join_all(
            pairs
                .iter()
                .map(|(catalog, schema)| async move { self.tables(client, catalog, schema).await }),
        )
        .await?;

        let mut names = Vec::new();
        for ((catalog, schema), tables) in pairs.iter().zip(table_lists) {
            for table in tables {
                names.push(format!("{}.{}.{}", catalog, schema, table));
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl SchemaExtractor for GalaxyExtractor {
    fn engine(&self) -> EngineType {
        self.engine
    }

    async fn list_tables(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<String>> {
        let client = GalaxyClient::from_descriptor(descriptor, self.timeouts)?;
        with_timeout(self.timeouts.query, self.walk(&client))
            .await
            .map_err(|e| match e {
                GatewayError::InvalidDescriptor(_) | GatewayError::Timeout(_) => e,
                other => GatewayError::MetadataExtraction(other.to_string()),
            })
    }

    /// Column detail is not available over the metadata surface.
    async fn list_columns(
        &self,
        _descriptor: &ConnectionDescriptor,
        _table: &str,
    ) -> GatewayResult<Vec<ColumnMetadata>> {
        Ok(Vec::new())
    }

    async fn extract(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<TableMetadata>> {
        let names = self.list_tables(descriptor).await?;
        Ok(names
            .into_iter()
            .map(|name| TableMetadata::new(name, Vec::new()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_array_filters_non_strings() {
        let names = string_array(json!(["tpch", 3, "sample"]));
        assert_eq!(names, vec!["tpch", "sample"]);
    }

    #[test]
    fn string_array_handles_non_array_payloads() {
        assert!(string_array(json!({"error": "forbidden"})).is_empty());
    }
}
