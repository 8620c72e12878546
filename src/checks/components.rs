//! Component integration smoke test
//!
//! Exercises the pieces the RAG demo composes (device, embedder, vector
//! store, generator) together. Each component gets its own result and a
//! failing component never stops the rest.

use super::CheckResult;
use crate::assets::{format_bytes, KeysFileStatus};
use crate::config::Config;
use crate::device::Device;
use crate::embed::{embed_one, Embedder};
use crate::error::{Error, Result};
use crate::llm::{self, LocalModelInfo, RemoteProbe};
use crate::store::{VectorRecord, VectorStore};
use tracing::debug;
use uuid::Uuid;

const REFERENCE_PASSAGES: [&str; 2] = [
    "The vector store keeps document embeddings for similarity search.",
    "Bananas are rich in potassium and grow in tropical climates.",
];
const RETRIEVAL_QUESTION: &str = "Where are document embeddings kept for similarity search?";
/// Reference passages live apart from user collections
const RETRIEVAL_COLLECTION_PREFIX: &str = "ragcheck_retrieval";

/// Everything loaded earlier in the run
pub struct ComponentContext<'a> {
    pub config: &'a Config,
    pub device: Device,
    pub no_local: bool,
    pub embedder: Option<&'a dyn Embedder>,
    /// Reason the embedder is missing, if it is
    pub embedder_error: Option<&'a str>,
    pub store: &'a dyn VectorStore,
    pub keys: &'a KeysFileStatus,
}

/// Check each RAG component in order and report one result per component
pub async fn check_rag_components(ctx: &ComponentContext<'_>) -> Vec<CheckResult> {
    let mut results = vec![
        CheckResult::success(
            "components.config",
            format!(
                "Configuration: embedding '{}', {} vector store",
                ctx.config.embedding.model, ctx.config.vector_db.backend
            ),
        ),
        CheckResult::success(
            "components.device",
            format!(
                "Device: {}{}",
                ctx.device,
                if ctx.device.is_accelerator() { " (accelerated)" } else { "" }
            ),
        ),
    ];

    results.push(match ctx.embedder {
        Some(embedder) => CheckResult::success(
            "components.embedding",
            format!(
                "Embedding model: {} ({} dims)",
                embedder.model_name(),
                embedder.dimension()
            ),
        ),
        None => CheckResult::failure(
            "components.embedding",
            format!(
                "Embedding model unavailable: {}",
                ctx.embedder_error.unwrap_or("not loaded")
            ),
        ),
    });

    let store_ready = match ctx.store.list_collections().await {
        Ok(collections) => {
            results.push(CheckResult::success(
                "components.vector_store",
                format!(
                    "Vector store: {} at {} ({} collection(s))",
                    ctx.store.backend(),
                    ctx.store.location(),
                    collections.len()
                ),
            ));
            true
        }
        Err(e) => {
            results.push(CheckResult::failure(
                "components.vector_store",
                format!("Vector store unavailable: {}", e),
            ));
            false
        }
    };

    results.push(match ctx.embedder {
        Some(embedder) if store_ready => {
            let collection = retrieval_collection(embedder.dimension());
            match retrieval_round_trip(embedder, ctx.store, &collection).await {
                Ok(score) => CheckResult::success(
                    "components.retrieval",
                    format!(
                        "Retrieval: matching passage ranked first in '{}' (score {:.3})",
                        collection, score
                    ),
                ),
                Err(e) => CheckResult::failure(
                    "components.retrieval",
                    format!("Retrieval round trip failed: {}", e),
                ),
            }
        }
        _ => CheckResult::skipped(
            "components.retrieval",
            "Retrieval skipped: needs both the embedding model and the vector store",
        ),
    });

    if ctx.no_local {
        results.extend(check_remote_generators(ctx).await);
    } else {
        results.push(check_local_generator(ctx.config));
    }

    results
}

fn retrieval_collection(dimension: usize) -> String {
    format!("{}_{}", RETRIEVAL_COLLECTION_PREFIX, dimension)
}

async fn retrieval_round_trip(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
) -> Result<f32> {
    let passages: Vec<String> = REFERENCE_PASSAGES.iter().map(|p| p.to_string()).collect();
    let vectors = embedder.embed(passages.clone()).await?;
    if vectors.len() != passages.len() {
        return Err(Error::Embedding(format!(
            "expected {} embeddings, got {}",
            passages.len(),
            vectors.len()
        )));
    }

    store.ensure_collection(collection, embedder.dimension()).await?;

    let records: Vec<VectorRecord> = passages
        .iter()
        .zip(vectors)
        .map(|(passage, vector)| {
            let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, passage.as_bytes());
            VectorRecord::new(id, vector, passage.clone()).with_metadata("source", "ragcheck")
        })
        .collect();
    store.upsert(collection, records).await?;

    let question = embed_one(embedder, RETRIEVAL_QUESTION).await?;
    let hits = store.query(collection, &question, 1).await?;
    let expected = Uuid::new_v5(&Uuid::NAMESPACE_OID, REFERENCE_PASSAGES[0].as_bytes()).to_string();

    match hits.first() {
        Some(hit) if hit.id == expected => {
            debug!("Retrieval hit {} with score {}", hit.id, hit.score);
            Ok(hit.score)
        }
        Some(hit) => Err(Error::VectorStore(format!(
            "unrelated passage ranked first: {}",
            hit.document.as_deref().unwrap_or(&hit.id)
        ))),
        None => Err(Error::VectorStore("query returned no results".to_string())),
    }
}

fn check_local_generator(config: &Config) -> CheckResult {
    let path = &config.llm.model_path;
    if !llm::local_model_exists(path) {
        return CheckResult::warning(
            "components.local_llm",
            format!("Local LLM: not found at {} (optional for demo)", path.display()),
        );
    }

    match LocalModelInfo::inspect(path) {
        Ok(info) if info.is_gguf() => CheckResult::success(
            "components.local_llm",
            format!(
                "Local LLM: {} ({}, {})",
                path.display(),
                info.format,
                format_bytes(info.size_bytes)
            ),
        ),
        Ok(info) => CheckResult::warning(
            "components.local_llm",
            format!(
                "Local LLM: {} is not a GGUF file ({})",
                path.display(),
                format_bytes(info.size_bytes)
            ),
        ),
        Err(e) => CheckResult::warning(
            "components.local_llm",
            format!("Local LLM: could not read {}: {}", path.display(), e),
        ),
    }
}

async fn check_remote_generators(ctx: &ComponentContext<'_>) -> Vec<CheckResult> {
    let probe = match RemoteProbe::new(&ctx.config.remote) {
        Ok(probe) => probe,
        Err(e) => {
            return vec![CheckResult::failure(
                "components.remote",
                format!("Remote inference client could not be created: {}", e),
            )]
        }
    };

    let ollama = probe.ollama().await;
    let ollama_result = if !ollama.reachable {
        CheckResult::warning(
            "components.ollama",
            format!(
                "Ollama not reachable at {}: {}",
                ollama.url,
                ollama.error.as_deref().unwrap_or("no response")
            ),
        )
    } else if ollama.models.is_empty() {
        CheckResult::warning(
            "components.ollama",
            format!("Ollama reachable at {} but no models are pulled", ollama.url),
        )
    } else {
        CheckResult::success(
            "components.ollama",
            format!(
                "Ollama reachable at {} ({} model(s))",
                ollama.url,
                ollama.models.len()
            ),
        )
    };

    let key_name = probe.deepseek_key_name();
    let deepseek_result = if probe.deepseek_key_configured(ctx.keys) {
        CheckResult::success(
            "components.deepseek",
            format!("DeepSeek API key configured ({})", key_name),
        )
    } else {
        CheckResult::warning(
            "components.deepseek",
            format!(
                "DeepSeek API key not configured (set {} in {})",
                key_name,
                ctx.keys.path.display()
            ),
        )
    };

    vec![ollama_result, deepseek_result]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckStatus;
    use crate::embed::testing::HashEmbedder;
    use crate::store::LocalVectorStore;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.llm.model_path = root.join("llm/model.gguf");
        config.remote.ollama_url = "http://127.0.0.1:9".to_string();
        config.remote.timeout_secs = 1;
        config.remote.deepseek_key_name = "RAGCHECK_TEST_DEEPSEEK_KEY_UNSET".to_string();
        config
    }

    fn no_keys() -> KeysFileStatus {
        KeysFileStatus {
            path: PathBuf::from(".keys"),
            exists: false,
            keys: vec![],
        }
    }

    fn names(results: &[CheckResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_components_all_present_local_mode() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(tmp.path().join("llm")).unwrap();
        let mut gguf = b"GGUF".to_vec();
        gguf.extend_from_slice(&3u32.to_le_bytes());
        std::fs::write(&config.llm.model_path, gguf).unwrap();

        let store = LocalVectorStore::open(&tmp.path().join("db")).await.unwrap();
        let embedder = HashEmbedder { dimension: 256 };
        let keys = no_keys();
        let ctx = ComponentContext {
            config: &config,
            device: Device::Cpu,
            no_local: false,
            embedder: Some(&embedder),
            embedder_error: None,
            store: &store,
            keys: &keys,
        };

        let results = check_rag_components(&ctx).await;
        assert_eq!(
            names(&results),
            vec![
                "components.config",
                "components.device",
                "components.embedding",
                "components.vector_store",
                "components.retrieval",
                "components.local_llm",
            ]
        );
        assert!(results.iter().all(|r| r.is_success()), "{:?}", results);
        assert!(results[5].message.contains("GGUF v3"));
    }

    #[tokio::test]
    async fn test_components_continue_without_embedder() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let store = LocalVectorStore::open(&tmp.path().join("db")).await.unwrap();
        let keys = no_keys();
        let ctx = ComponentContext {
            config: &config,
            device: Device::Cpu,
            no_local: false,
            embedder: None,
            embedder_error: Some("Unsupported embedding model 'nope'"),
            store: &store,
            keys: &keys,
        };

        let results = check_rag_components(&ctx).await;
        assert_eq!(results.len(), 6);
        assert_eq!(results[2].status, CheckStatus::Failure);
        assert!(results[2].message.contains("nope"));
        assert!(results[3].is_success());
        assert_eq!(results[4].status, CheckStatus::Skipped);
        assert_eq!(results[5].status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_components_retrieval_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        let store = LocalVectorStore::open(&tmp.path().join("db")).await.unwrap();
        let embedder = HashEmbedder { dimension: 256 };

        let collection = retrieval_collection(256);
        retrieval_round_trip(&embedder, &store, &collection).await.unwrap();
        retrieval_round_trip(&embedder, &store, &collection).await.unwrap();
        assert_eq!(store.count(&collection).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_components_retrieval_leaves_user_collection_alone() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let store = LocalVectorStore::open(&tmp.path().join("db")).await.unwrap();
        let embedder = HashEmbedder { dimension: 256 };

        // A user document identical to the question would outrank any reference passage
        let user_collection = format!("{}_256", config.vector_db.collection_name);
        store.ensure_collection(&user_collection, 256).await.unwrap();
        let user_doc = VectorRecord::new(
            Uuid::new_v4(),
            embedder.vector(RETRIEVAL_QUESTION),
            RETRIEVAL_QUESTION,
        );
        store.upsert(&user_collection, vec![user_doc]).await.unwrap();

        let keys = no_keys();
        let ctx = ComponentContext {
            config: &config,
            device: Device::Cpu,
            no_local: false,
            embedder: Some(&embedder),
            embedder_error: None,
            store: &store,
            keys: &keys,
        };
        let results = check_rag_components(&ctx).await;

        let retrieval = &results[4];
        assert_eq!(retrieval.name, "components.retrieval");
        assert!(retrieval.is_success(), "{}", retrieval.message);
        assert!(retrieval.message.contains("ragcheck_retrieval_256"));
        assert_eq!(store.count(&user_collection).await.unwrap(), 1);
        assert_eq!(store.count("ragcheck_retrieval_256").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_components_remote_mode_skips_local_llm() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let store = LocalVectorStore::open(&tmp.path().join("db")).await.unwrap();
        let embedder = HashEmbedder { dimension: 16 };
        let keys = KeysFileStatus {
            path: tmp.path().join(".keys"),
            exists: true,
            keys: vec!["RAGCHECK_TEST_DEEPSEEK_KEY_UNSET".to_string()],
        };
        let ctx = ComponentContext {
            config: &config,
            device: Device::Cpu,
            no_local: true,
            embedder: Some(&embedder),
            embedder_error: None,
            store: &store,
            keys: &keys,
        };

        let results = check_rag_components(&ctx).await;
        let names = names(&results);
        assert!(!names.contains(&"components.local_llm"));
        assert_eq!(&names[5..], &["components.ollama", "components.deepseek"]);
        assert_eq!(results[5].status, CheckStatus::Warning);
        assert!(results[6].is_success());
    }
}
