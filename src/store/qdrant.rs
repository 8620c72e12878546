//! Qdrant vector database backend

use super::{QueryHit, VectorRecord, VectorStore};
use crate::config::VectorBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, GetCollectionInfoResponse, PointId,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::{debug, info};

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Build a client. No connection is made until the first request.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let mut builder = Qdrant::from_url(url).skip_compatibility_check();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn collection_vector_size(&self, name: &str) -> Result<Option<u64>> {
        let info = self.client.collection_info(name).await?;
        Ok(extract_vector_size(&info))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn backend(&self) -> VectorBackend {
        VectorBackend::Qdrant
    }

    fn location(&self) -> String {
        self.url.clone()
    }

    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        if self.client.collection_exists(name).await? {
            debug!("Collection {} already exists", name);

            if let Some(size) = self.collection_vector_size(name).await? {
                if size as usize != dimension {
                    return Err(Error::VectorStore(format!(
                        "Collection '{}' has dimension {}, expected {}",
                        name, size, dimension
                    )));
                }
            }
            return Ok(());
        }

        info!("Creating collection {} with dimension {}", name, dimension);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        debug!("Upserting {} points to collection {}", records.len(), collection);

        let points: Vec<PointStruct> = records.into_iter().map(to_point_struct).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;

        Ok(())
    }

    async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<QueryHit>> {
        debug!("Searching collection {} with limit {}", collection, limit);

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|p| QueryHit {
                id: point_id_to_string(p.id),
                score: p.score,
                document: p.payload.get("document").and_then(qdrant_string),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self.client.list_collections().await?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }
}

fn to_point_struct(record: VectorRecord) -> PointStruct {
    let mut payload: HashMap<String, QdrantValue> = HashMap::new();
    payload.insert("document".to_string(), QdrantValue::from(record.document));
    for (key, value) in record.metadata {
        payload.insert(key, QdrantValue::from(value));
    }
    PointStruct::new(record.id.to_string(), record.vector, payload)
}

fn qdrant_string(value: &QdrantValue) -> Option<String> {
    use qdrant_client::qdrant::value::Kind;

    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn extract_vector_size(info: &GetCollectionInfoResponse) -> Option<u64> {
    let result = info.result.as_ref()?;
    let config = result.config.as_ref()?;
    let params = config.params.as_ref()?;
    let vectors_config = params.vectors_config.as_ref()?;

    match vectors_config.config.as_ref()? {
        qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
        qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => None,
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    match id {
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)),
        }) => uuid,
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)),
        }) => num.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_point_struct_carries_document() {
        let id = Uuid::new_v4();
        let point = to_point_struct(
            VectorRecord::new(id, vec![0.1, 0.2], "hello").with_metadata("source", "ragcheck"),
        );

        assert_eq!(
            point.payload.get("document").and_then(qdrant_string).as_deref(),
            Some("hello")
        );
        assert_eq!(
            point.payload.get("source").and_then(qdrant_string).as_deref(),
            Some("ragcheck")
        );
        assert_eq!(point_id_to_string(point.id), id.to_string());
    }

    #[test]
    fn test_point_id_to_string_handles_missing() {
        assert_eq!(point_id_to_string(None), "");
        assert_eq!(point_id_to_string(Some(PointId::from(7u64))), "7");
    }
}
