//! FastEmbed implementation for local embeddings

use super::Embedder;
use crate::config::{known_embedding_model, EmbeddingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A configured identifier matched to a fastembed model
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model: EmbeddingModel,
    /// Model code fastembed downloads from
    pub code: String,
    pub dimension: usize,
}

fn short_name(code: &str) -> &str {
    code.rsplit('/').next().unwrap_or(code)
}

/// Map a model identifier onto one of fastembed's supported models.
///
/// Exact model codes win over short names; the alias table maps
/// sentence-transformers style ids onto the ONNX exports fastembed lists.
pub fn resolve_model(model: &str) -> Result<ResolvedModel> {
    let mut wanted = vec![model.to_string()];
    if let Some(known) = known_embedding_model(model) {
        wanted.push(known.repo.to_string());
    }

    let supported = TextEmbedding::list_supported_models();
    let exact = supported.iter().find(|info| {
        wanted
            .iter()
            .any(|w| info.model_code.eq_ignore_ascii_case(w))
    });
    let found = exact.or_else(|| {
        supported.iter().find(|info| {
            wanted
                .iter()
                .any(|w| short_name(&info.model_code).eq_ignore_ascii_case(short_name(w)))
        })
    });

    match found {
        Some(info) => {
            debug!("Resolved {} to fastembed model {}", model, info.model_code);
            Ok(ResolvedModel {
                model: info.model.clone(),
                code: info.model_code.clone(),
                dimension: info.dim,
            })
        }
        None => Err(Error::Embedding(format!(
            "Unsupported embedding model '{}'",
            model
        ))),
    }
}

/// FastEmbed-based embedder
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the configured model, downloading it into the cache if needed.
    ///
    /// Blocking: call from `spawn_blocking` inside async code.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        info!("Initializing FastEmbed with model: {}", config.model);

        let resolved = resolve_model(&config.model)?;
        let dimension = resolved.dimension;

        debug!("Using embedding cache {:?}", config.cache_dir);
        let options = InitOptions::new(resolved.model)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("Failed to initialize model: {}", e)))?;

        info!("FastEmbed model loaded successfully");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: config.model.clone(),
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts", texts.len());

        // FastEmbed is synchronous, so we wrap in blocking task
        let model = self.model.clone();
        let embeddings = tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            model.embed(texts, None)
        })
        .await
        .map_err(|e| Error::Embedding(format!("Task join error: {}", e)))?
        .map_err(|e| Error::Embedding(format!("Embedding failed: {}", e)))?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
