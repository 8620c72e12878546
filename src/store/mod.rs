//! Vector store clients
//!
//! This module provides:
//! - A trait over vector store backends
//! - A persisted local backend (SQLite file in the configured directory)
//! - A Qdrant backend

mod local;
mod qdrant;

pub use local::*;
pub use qdrant::*;

use crate::config::{VectorBackend, VectorDbConfig};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// A record ready to be upserted
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: Map<String, Value>,
}

impl VectorRecord {
    pub fn new(id: Uuid, vector: Vec<f32>, document: impl Into<String>) -> Self {
        Self {
            id,
            vector,
            document: document.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// A query hit
#[derive(Debug, Clone, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub score: f32,
    pub document: Option<String>,
}

/// Trait for vector store backends
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name used in reports
    fn backend(&self) -> VectorBackend;

    /// Where the store lives (directory or URL)
    fn location(&self) -> String;

    /// Create the collection if missing; error on a dimension mismatch
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Insert or replace records by id
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Nearest records by cosine similarity, best first
    async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<QueryHit>>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Names of all collections
    async fn list_collections(&self) -> Result<Vec<String>>;
}

/// Construct the configured vector store client
pub async fn open_store(config: &VectorDbConfig) -> Result<Box<dyn VectorStore>> {
    let backend = config.backend_kind()?;
    debug!("Opening {} vector store", backend);

    match backend {
        VectorBackend::Local => Ok(Box::new(LocalVectorStore::open(&config.path).await?)),
        VectorBackend::Qdrant => Ok(Box::new(QdrantStore::new(
            &config.qdrant_url,
            config.qdrant_api_key(),
        )?)),
    }
}

/// Cosine similarity; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
