//! Configuration management for ragcheck
//!
//! Settings come from an optional TOML file. Anything the file leaves out
//! falls back to environment-derived defaults, and the result is validated
//! before any check runs.

mod defaults;

pub use defaults::*;

use crate::device::DevicePreference;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Local language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Remote inference providers
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Vector database configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,

    /// Model cache directories
    #[serde(default)]
    pub cache: CacheConfig,

    /// Path to the API key file
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,

    /// Compute device preference (auto, cpu, cuda, metal)
    #[serde(default = "default_device")]
    pub device: String,

    /// Where this configuration was read from, if anywhere
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Directory the model files are cached in
    #[serde(default = "default_embedding_cache_dir")]
    pub cache_dir: PathBuf,

    /// Show download progress when the model has to be fetched
    #[serde(default = "default_show_download_progress")]
    pub show_download_progress: bool,
}

/// Local language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Path to the local model weights (GGUF)
    #[serde(default = "default_llm_model_path")]
    pub model_path: PathBuf,
}

/// Remote inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Ollama base URL
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Key name looked up in the key file / environment for DeepSeek
    #[serde(default = "default_deepseek_key_name")]
    pub deepseek_key_name: String,

    /// Probe timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Backend kind: "local" (persisted SQLite directory) or "qdrant"
    #[serde(default = "default_vector_backend")]
    pub backend: String,

    /// Persisted store directory (local backend)
    #[serde(default = "default_vector_db_path")]
    pub path: PathBuf,

    /// Qdrant connection URL (qdrant backend)
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Environment variable name for Qdrant API key
    #[serde(default = "default_qdrant_api_key_env")]
    pub qdrant_api_key_env: String,

    /// Collection used by the RAG demo
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

/// Model cache directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Hugging Face transformers cache
    #[serde(default = "default_transformers_cache_dir")]
    pub transformers_dir: PathBuf,

    /// Directory holding local LLM weights (defaults to the model's parent)
    #[serde(default)]
    pub llm_dir: Option<PathBuf>,
}

/// Vector store backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Local,
    Qdrant,
}

impl fmt::Display for VectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorBackend::Local => write!(f, "local"),
            VectorBackend::Qdrant => write!(f, "qdrant"),
        }
    }
}

impl FromStr for VectorBackend {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(Error::Config(format!(
                "Unsupported vector backend '{}'; expected 'local' or 'qdrant'",
                value
            ))),
        }
    }
}

/// A supported embedding model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownEmbeddingModel {
    pub id: &'static str,
    pub dimension: usize,
    /// Hugging Face repository fastembed downloads the ONNX export from
    pub repo: &'static str,
}

pub const KNOWN_EMBEDDING_MODELS: &[KnownEmbeddingModel] = &[
    KnownEmbeddingModel {
        id: "sentence-transformers/all-MiniLM-L6-v2",
        dimension: 384,
        repo: "Qdrant/all-MiniLM-L6-v2-onnx",
    },
    KnownEmbeddingModel {
        id: "sentence-transformers/all-MiniLM-L12-v2",
        dimension: 384,
        repo: "Xenova/all-MiniLM-L12-v2",
    },
    KnownEmbeddingModel {
        id: "BAAI/bge-small-en-v1.5",
        dimension: 384,
        repo: "Xenova/bge-small-en-v1.5",
    },
    KnownEmbeddingModel {
        id: "BAAI/bge-base-en-v1.5",
        dimension: 768,
        repo: "Xenova/bge-base-en-v1.5",
    },
    KnownEmbeddingModel {
        id: "BAAI/bge-large-en-v1.5",
        dimension: 1024,
        repo: "Xenova/bge-large-en-v1.5",
    },
];

/// Lookup a supported model; short names ("all-MiniLM-L6-v2") match too
pub fn known_embedding_model(model: &str) -> Option<&'static KnownEmbeddingModel> {
    KNOWN_EMBEDDING_MODELS.iter().find(|known| {
        known.id == model || known.id.rsplit('/').next() == Some(model)
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            remote: RemoteConfig::default(),
            vector_db: VectorDbConfig::default(),
            cache: CacheConfig::default(),
            keys_file: default_keys_file(),
            device: default_device(),
            source: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: default_embedding_cache_dir(),
            show_download_progress: default_show_download_progress(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_path: default_llm_model_path(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            deepseek_key_name: default_deepseek_key_name(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            path: default_vector_db_path(),
            qdrant_url: default_qdrant_url(),
            qdrant_api_key_env: default_qdrant_api_key_env(),
            collection_name: default_collection_name(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            transformers_dir: default_transformers_cache_dir(),
            llm_dir: None,
        }
    }
}

impl VectorDbConfig {
    /// Parsed backend kind
    pub fn backend_kind(&self) -> Result<VectorBackend> {
        self.backend.parse()
    }

    /// Get the Qdrant API key from environment
    pub fn qdrant_api_key(&self) -> Option<String> {
        if self.qdrant_api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.qdrant_api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Get the default base directory for ragcheck (~/.ragcheck)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragcheck")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without validating it
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parsed vector backend kind
    pub fn vector_backend(&self) -> Result<VectorBackend> {
        self.vector_db.backend_kind()
    }

    /// Parsed device preference
    pub fn device_preference(&self) -> Result<DevicePreference> {
        self.device.parse()
    }

    /// Directory holding local LLM weights
    pub fn llm_directory(&self) -> PathBuf {
        if let Some(dir) = &self.cache.llm_dir {
            return dir.clone();
        }
        self.llm
            .model_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.embedding.model.trim().is_empty() {
            return Err(Error::Config("embedding.model must not be empty".to_string()));
        }

        if self.vector_db.path.as_os_str().is_empty() {
            return Err(Error::Config("vector_db.path must not be empty".to_string()));
        }

        let name = &self.vector_db.collection_name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "vector_db.collection_name '{}' must be non-empty and contain only letters, digits, '_' or '-'",
                name
            )));
        }

        self.vector_backend()?;
        self.device_preference()?;

        validate_http_url("vector_db.qdrant_url", &self.vector_db.qdrant_url)?;
        validate_http_url("remote.ollama_url", &self.remote.ollama_url)?;

        if self.remote.timeout_secs == 0 {
            return Err(Error::Config(
                "remote.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Human-readable listing of every setting
    pub fn summary(&self) -> Vec<(String, String)> {
        let source = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string());

        vec![
            ("Config source".to_string(), source),
            ("Embedding model".to_string(), self.embedding.model.clone()),
            (
                "Embedding cache".to_string(),
                self.embedding.cache_dir.display().to_string(),
            ),
            (
                "Local LLM path".to_string(),
                self.llm.model_path.display().to_string(),
            ),
            ("Ollama URL".to_string(), self.remote.ollama_url.clone()),
            ("Vector backend".to_string(), self.vector_db.backend.clone()),
            (
                "Vector store path".to_string(),
                self.vector_db.path.display().to_string(),
            ),
            ("Qdrant URL".to_string(), self.vector_db.qdrant_url.clone()),
            (
                "Collection".to_string(),
                self.vector_db.collection_name.clone(),
            ),
            (
                "Transformers cache".to_string(),
                self.cache.transformers_dir.display().to_string(),
            ),
            (
                "LLM directory".to_string(),
                self.llm_directory().display().to_string(),
            ),
            ("Keys file".to_string(), self.keys_file.display().to_string()),
            ("Device preference".to_string(), self.device.clone()),
        ]
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| Error::Config(format!("{} '{}' is not a valid URL: {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}
