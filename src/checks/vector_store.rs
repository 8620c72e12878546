//! Vector store smoke test

use super::CheckResult;
use crate::error::{Error, Result};
use crate::store::{VectorRecord, VectorStore};
use tracing::warn;
use uuid::Uuid;

/// Collection the smoke test writes to
pub const SMOKE_COLLECTION: &str = "ragcheck_smoke";

const SMOKE_VECTOR: [f32; 4] = [0.1, 0.2, 0.3, 0.4];
const SMOKE_DOCUMENT: &str = "ragcheck vector store smoke test record";

/// Stable id so repeated runs replace the same record
pub fn smoke_record_id() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, b"ragcheck/vector-store-smoke")
}

/// Insert the probe record, read it back, and summarize the store
pub async fn check_vector_store(store: &dyn VectorStore) -> CheckResult {
    match run_round_trip(store).await {
        Ok(message) => CheckResult::success("vector_store", message),
        Err(e) => {
            warn!("Vector store smoke test failed: {}", e);
            CheckResult::warning(
                "vector_store",
                format!("Vector store test failed ({}): {}", store.backend(), e),
            )
        }
    }
}

async fn run_round_trip(store: &dyn VectorStore) -> Result<String> {
    store
        .ensure_collection(SMOKE_COLLECTION, SMOKE_VECTOR.len())
        .await?;

    let id = smoke_record_id();
    let record = VectorRecord::new(id, SMOKE_VECTOR.to_vec(), SMOKE_DOCUMENT)
        .with_metadata("source", "ragcheck");
    store.upsert(SMOKE_COLLECTION, vec![record]).await?;

    let hits = store.query(SMOKE_COLLECTION, &SMOKE_VECTOR, 1).await?;
    match hits.first() {
        Some(hit) if hit.id == id.to_string() => {}
        Some(hit) => {
            return Err(Error::VectorStore(format!(
                "query returned '{}' instead of the probe record",
                hit.id
            )))
        }
        None => {
            return Err(Error::VectorStore(
                "query returned no results for the probe record".to_string(),
            ))
        }
    }

    let records = store.count(SMOKE_COLLECTION).await?;
    let collections = store.list_collections().await?.len();

    Ok(format!(
        "Vector store operations successful ({} at {}): {} collection(s), {} record(s) in '{}'",
        store.backend(),
        store.location(),
        collections,
        records,
        SMOKE_COLLECTION
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckStatus;
    use crate::store::LocalVectorStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_vector_store_smoke_succeeds() {
        let tmp = TempDir::new().unwrap();
        let store = LocalVectorStore::open(tmp.path()).await.unwrap();

        let result = check_vector_store(&store).await;
        assert!(result.is_success(), "{}", result.message);
        assert!(result.message.contains("1 record(s)"));
    }

    #[tokio::test]
    async fn test_vector_store_smoke_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalVectorStore::open(tmp.path()).await.unwrap();

        let first = check_vector_store(&store).await;
        let second = check_vector_store(&store).await;
        assert!(first.is_success());
        assert_eq!(first, second);
        assert_eq!(store.count(SMOKE_COLLECTION).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_vector_store_smoke_survives_reopen_with_prior_data() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LocalVectorStore::open(tmp.path()).await.unwrap();
            store.ensure_collection("rag_demo_384", 384).await.unwrap();
            assert!(check_vector_store(&store).await.is_success());
        }

        let store = LocalVectorStore::open(tmp.path()).await.unwrap();
        let result = check_vector_store(&store).await;
        assert!(result.is_success());
        assert!(result.message.contains("2 collection(s)"));
    }

    #[tokio::test]
    async fn test_vector_store_conflicting_collection_is_warning() {
        let tmp = TempDir::new().unwrap();
        let store = LocalVectorStore::open(tmp.path()).await.unwrap();
        store.ensure_collection(SMOKE_COLLECTION, 8).await.unwrap();

        let first = check_vector_store(&store).await;
        let second = check_vector_store(&store).await;
        assert_eq!(first.status, CheckStatus::Warning);
        assert!(first.message.contains("dimension"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_smoke_record_id_is_stable() {
        assert_eq!(smoke_record_id(), smoke_record_id());
    }
}
