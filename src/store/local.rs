//! Persisted local vector store backed by SQLite

use super::{cosine_similarity, QueryHit, VectorRecord, VectorStore};
use crate::config::VectorBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File created inside the configured store directory
pub const LOCAL_STORE_FILE: &str = "vectors.sqlite3";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimension INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL REFERENCES collections(name),
    id TEXT NOT NULL,
    document TEXT NOT NULL,
    metadata_json TEXT,
    embedding BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
"#;

/// Local vector store handle
#[derive(Clone)]
pub struct LocalVectorStore {
    pool: SqlitePool,
    dir: PathBuf,
}

impl LocalVectorStore {
    /// Open (or create) the store in a directory
    pub async fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(LOCAL_STORE_FILE);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Opening local vector store at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self {
            pool,
            dir: dir.to_path_buf(),
        })
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT dimension FROM collections WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(dimension,)| dimension as usize))
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn backend(&self) -> VectorBackend {
        VectorBackend::Local
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        match self.collection_dimension(name).await? {
            Some(existing) if existing != dimension => Err(Error::VectorStore(format!(
                "Collection '{}' has dimension {}, expected {}",
                name, existing, dimension
            ))),
            Some(_) => {
                debug!("Collection {} already exists", name);
                Ok(())
            }
            None => {
                info!("Creating collection {} with dimension {}", name, dimension);
                sqlx::query(
                    "INSERT OR IGNORE INTO collections (name, dimension, created_at) VALUES (?, ?, ?)",
                )
                .bind(name)
                .bind(dimension as i64)
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
                Ok(())
            }
        }
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let dimension = self.collection_dimension(collection).await?.ok_or_else(|| {
            Error::VectorStore(format!("Collection '{}' does not exist", collection))
        })?;

        if let Some(mismatch) = records.iter().find(|r| r.vector.len() != dimension) {
            return Err(Error::VectorStore(format!(
                "Vector dimension mismatch for collection '{}': expected {} (got {})",
                collection,
                dimension,
                mismatch.vector.len()
            )));
        }

        debug!("Upserting {} records to collection {}", records.len(), collection);

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for record in records {
            let metadata_json = if record.metadata.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&record.metadata)?)
            };

            sqlx::query(
                r#"
                INSERT INTO records (collection, id, document, metadata_json, embedding, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(collection)
            .bind(record.id.to_string())
            .bind(&record.document)
            .bind(metadata_json)
            .bind(encode_vector(&record.vector))
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<QueryHit>> {
        debug!("Querying collection {} with limit {}", collection, limit);

        let rows: Vec<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT id, document, embedding FROM records WHERE collection = ?")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        let mut hits: Vec<QueryHit> = rows
            .into_iter()
            .map(|(id, document, embedding)| QueryHit {
                id,
                score: cosine_similarity(vector, &decode_vector(&embedding)),
                document: Some(document),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
