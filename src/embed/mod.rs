//! Embedding model access
//!
//! This module provides:
//! - A trait over embedding backends
//! - The fastembed backend (feature `local-embed`)
//! - The fixed probe used by the smoke tests

#[cfg(feature = "local-embed")]
mod fastembed_impl;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Fixed input embedded by the smoke test
pub const PROBE_TEXT: &str = "This is a test sentence.";

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Embed a single text
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(vec![text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("Model returned no embedding".to_string()))
}

/// Embed the probe text and return the vector's dimensionality
pub async fn probe_dimension(embedder: &dyn Embedder) -> Result<usize> {
    let vector = embed_one(embedder, PROBE_TEXT).await?;

    if vector.is_empty() {
        return Err(Error::Embedding(format!(
            "Model '{}' returned an empty vector",
            embedder.model_name()
        )));
    }

    if vector.len() != embedder.dimension() {
        return Err(Error::Embedding(format!(
            "Embedding dimension mismatch for model '{}': expected {}, got {}",
            embedder.model_name(),
            embedder.dimension(),
            vector.len()
        )));
    }

    if vector.iter().any(|v| !v.is_finite()) {
        return Err(Error::Embedding(format!(
            "Model '{}' produced non-finite values",
            embedder.model_name()
        )));
    }

    Ok(vector.len())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic embedders for tests that must not download models

    use super::*;

    /// Hashes character trigrams into signed buckets
    pub struct HashEmbedder {
        pub dimension: usize,
    }

    impl HashEmbedder {
        pub fn vector(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; self.dimension];
            let chars: Vec<char> = text.to_lowercase().chars().collect();
            for window in chars.windows(3) {
                let mut hash: u64 = 1469598103934665603;
                for c in window {
                    hash ^= *c as u64;
                    hash = hash.wrapping_mul(1099511628211);
                }
                let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
                vector[(hash % self.dimension as u64) as usize] += sign;
            }
            vector
        }
    }

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.vector(t)).collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "test/hash-embedder"
        }
    }

    /// Claims one dimension and returns another
    pub struct LyingEmbedder;

    #[async_trait]
    impl Embedder for LyingEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; 3]).collect())
        }

        fn dimension(&self) -> usize {
            8
        }

        fn model_name(&self) -> &str {
            "test/lying-embedder"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{HashEmbedder, LyingEmbedder};
    use super::*;

    #[tokio::test]
    async fn test_probe_dimension_is_stable() {
        let embedder = HashEmbedder { dimension: 16 };
        let first = probe_dimension(&embedder).await.unwrap();
        let second = probe_dimension(&embedder).await.unwrap();
        assert_eq!(first, 16);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_probe_dimension_rejects_mismatch() {
        let err = probe_dimension(&LyingEmbedder).await.unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[tokio::test]
    async fn test_embed_one_returns_single_vector() {
        let embedder = HashEmbedder { dimension: 8 };
        let vector = embed_one(&embedder, "hello world").await.unwrap();
        assert_eq!(vector.len(), 8);
    }
}
