//! Embedding smoke test

use super::CheckResult;
use crate::config::EmbeddingConfig;
use crate::embed::{probe_dimension, Embedder};
use crate::verify::ComponentFactory;
use tracing::{info, warn};

/// Outcome of the embedding smoke test
pub struct EmbeddingCheck {
    pub result: CheckResult,
    /// Loaded model, kept for the component test
    pub embedder: Option<Box<dyn Embedder>>,
    pub dimension: Option<usize>,
    /// Why the model could not be loaded
    pub load_error: Option<String>,
}

/// Load the embedding model and embed the probe sentence
pub async fn check_embedding_model(
    factory: &dyn ComponentFactory,
    config: &EmbeddingConfig,
) -> EmbeddingCheck {
    let embedder = match factory.load_embedder(config).await {
        Ok(embedder) => embedder,
        Err(e) => {
            warn!("Embedding model {} failed to load: {}", config.model, e);
            return EmbeddingCheck {
                result: CheckResult::failure(
                    "embedding",
                    format!("Embedding model test failed: {}", e),
                ),
                embedder: None,
                dimension: None,
                load_error: Some(e.to_string()),
            };
        }
    };

    match probe_dimension(embedder.as_ref()).await {
        Ok(dimension) => {
            info!("Embedding model {} produced {} dimensions", config.model, dimension);
            EmbeddingCheck {
                result: CheckResult::success(
                    "embedding",
                    format!("Embedding model working (dimension: {})", dimension),
                ),
                embedder: Some(embedder),
                dimension: Some(dimension),
                load_error: None,
            }
        }
        Err(e) => EmbeddingCheck {
            result: CheckResult::failure("embedding", format!("Embedding model test failed: {}", e)),
            embedder: Some(embedder),
            dimension: None,
            load_error: None,
        },
    }
}
