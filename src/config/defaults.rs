//! Default values for configuration

use std::path::PathBuf;

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Default embedding model (sentence-transformers/all-MiniLM-L6-v2)
pub fn default_embedding_model() -> String {
    env_or(
        "RAGCHECK_EMBEDDING_MODEL",
        "sentence-transformers/all-MiniLM-L6-v2",
    )
}

/// Embedding model cache directory
pub fn default_embedding_cache_dir() -> PathBuf {
    embedding_cache_dir_from(|name| std::env::var(name).ok())
}

/// `RAGCHECK_EMBEDDING_CACHE`, then `SENTENCE_TRANSFORMERS_HOME`, then `./models/embedding`
pub fn embedding_cache_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    ["RAGCHECK_EMBEDDING_CACHE", "SENTENCE_TRANSFORMERS_HOME"]
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./models/embedding"))
}

/// Fastembed's download bar stays off; the load spinner covers downloads
pub fn default_show_download_progress() -> bool {
    false
}

/// Default local LLM weights file
pub fn default_llm_model_path() -> PathBuf {
    PathBuf::from(env_or(
        "RAGCHECK_LLM_MODEL_PATH",
        "./models/llm/llama-2-7b-chat.Q4_K_M.gguf",
    ))
}

/// Default Ollama endpoint
pub fn default_ollama_url() -> String {
    env_or("OLLAMA_HOST", "http://127.0.0.1:11434")
}

/// Key name that holds the DeepSeek API key
pub fn default_deepseek_key_name() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

/// Remote probe timeout in seconds
pub fn default_remote_timeout() -> u64 {
    3
}

/// Default vector backend kind
pub fn default_vector_backend() -> String {
    env_or("RAGCHECK_VECTOR_BACKEND", "local")
}

/// Default persisted vector store directory
pub fn default_vector_db_path() -> PathBuf {
    PathBuf::from(env_or("RAGCHECK_VECTOR_DB_PATH", "./vector_db"))
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    env_or("QDRANT_URL", "http://127.0.0.1:6334")
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

/// Default collection name
pub fn default_collection_name() -> String {
    "rag_demo".to_string()
}

/// Default Hugging Face transformers cache
pub fn default_transformers_cache_dir() -> PathBuf {
    PathBuf::from(env_or("RAGCHECK_TRANSFORMERS_CACHE", "./models/transformers"))
}

/// Default API key file
pub fn default_keys_file() -> PathBuf {
    PathBuf::from(env_or("RAGCHECK_KEYS_FILE", ".keys"))
}

/// Default compute device preference
pub fn default_device() -> String {
    env_or("RAGCHECK_DEVICE", "auto")
}
