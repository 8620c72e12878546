//! Local asset probes
//!
//! Existence checks for model caches, the API key file and cache
//! directories. Nothing here mutates the filesystem, and a missing asset is
//! never an error.

use crate::config::{known_embedding_model, Config};
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Check whether an embedding model is already present in a cache directory.
///
/// Recognizes the Hugging Face hub layout (`models--org--name`), the repo
/// fastembed downloads from, and the flat sentence-transformers layout
/// (`org_name`).
pub fn embedding_model_cached(model: &str, cache_dir: &Path) -> bool {
    embedding_cache_candidates(model, cache_dir)
        .iter()
        .any(|candidate| candidate.is_dir())
}

fn embedding_cache_candidates(model: &str, cache_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![
        cache_dir.join(format!("models--{}", model.replace('/', "--"))),
        cache_dir.join(model.replace('/', "_")),
    ];
    if let Some(known) = known_embedding_model(model) {
        candidates.push(cache_dir.join(format!("models--{}", known.repo.replace('/', "--"))));
        candidates.push(cache_dir.join(known.id.replace('/', "_")));
    }
    candidates
}

/// Outcome of looking for the API key file
#[derive(Debug, Clone, Serialize)]
pub struct KeysFileStatus {
    pub path: PathBuf,
    pub exists: bool,
    /// Key names defined in the file (values are never kept)
    pub keys: Vec<String>,
}

impl KeysFileStatus {
    pub fn has_key(&self, name: &str) -> bool {
        self.keys.iter().any(|key| key == name)
    }
}

/// Look for the API key file and list the key names it defines
pub fn check_api_keys_file(path: &Path) -> KeysFileStatus {
    let exists = path.is_file();
    let keys = if exists {
        match read_key_names(path) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not parse key file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    KeysFileStatus {
        path: path.to_path_buf(),
        exists,
        keys,
    }
}

fn read_key_names(path: &Path) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        if !value.trim().is_empty() {
            keys.push(key);
        }
    }
    keys.sort();
    keys.dedup();
    Ok(keys)
}

/// A cache directory and what it holds
#[derive(Debug, Clone, Serialize)]
pub struct CacheDirInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub files: u64,
    pub bytes: u64,
}

impl CacheDirInfo {
    /// Inspect a directory, summing regular files beneath it
    pub fn inspect(path: &Path) -> Self {
        if !path.is_dir() {
            return Self {
                path: path.to_path_buf(),
                exists: false,
                files: 0,
                bytes: 0,
            };
        }

        let mut files = 0u64;
        let mut bytes = 0u64;
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files += 1;
                bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        debug!("{}: {} files, {} bytes", path.display(), files, bytes);

        Self {
            path: path.to_path_buf(),
            exists: true,
            files,
            bytes,
        }
    }

    /// Short description used in the report
    pub fn describe(&self) -> String {
        if self.exists {
            format!(
                "{} ({} files, {})",
                self.path.display(),
                self.files,
                format_bytes(self.bytes)
            )
        } else {
            format!("{} (not created yet)", self.path.display())
        }
    }
}

/// Model cache directories the RAG demo relies on
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub embedding_cache: CacheDirInfo,
    pub transformers_cache: CacheDirInfo,
    pub llm_directory: CacheDirInfo,
}

/// Collect cache directory information from configuration
pub fn cache_info(config: &Config) -> CacheInfo {
    CacheInfo {
        embedding_cache: CacheDirInfo::inspect(&config.embedding.cache_dir),
        transformers_cache: CacheDirInfo::inspect(&config.cache.transformers_dir),
        llm_directory: CacheDirInfo::inspect(&config.llm_directory()),
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedding_model_cached_layouts() {
        let tmp = TempDir::new().unwrap();
        let model = "sentence-transformers/all-MiniLM-L6-v2";
        assert!(!embedding_model_cached(model, tmp.path()));

        std::fs::create_dir_all(tmp.path().join("sentence-transformers_all-MiniLM-L6-v2")).unwrap();
        assert!(embedding_model_cached(model, tmp.path()));
    }

    #[test]
    fn test_embedding_model_cached_fastembed_repo() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("models--Xenova--bge-small-en-v1.5")).unwrap();
        assert!(embedding_model_cached("BAAI/bge-small-en-v1.5", tmp.path()));
        assert!(!embedding_model_cached("BAAI/bge-base-en-v1.5", tmp.path()));
    }

    #[test]
    fn test_embedding_model_cached_ignores_plain_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("models--custom--model"), b"").unwrap();
        assert!(!embedding_model_cached("custom/model", tmp.path()));
    }

    #[test]
    fn test_keys_file_lists_names_only() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".keys");
        std::fs::write(
            &path,
            "# provider keys\nDEEPSEEK_API_KEY=sk-test\nOPENAI_API_KEY=\nHF_TOKEN=\"hf_abc\"\n",
        )
        .unwrap();

        let status = check_api_keys_file(&path);
        assert!(status.exists);
        assert_eq!(status.keys, vec!["DEEPSEEK_API_KEY", "HF_TOKEN"]);
        assert!(status.has_key("DEEPSEEK_API_KEY"));
        assert!(!status.has_key("OPENAI_API_KEY"));
    }

    #[test]
    fn test_keys_file_missing() {
        let tmp = TempDir::new().unwrap();
        let status = check_api_keys_file(&tmp.path().join(".keys"));
        assert!(!status.exists);
        assert!(status.keys.is_empty());
    }

    #[test]
    fn test_cache_dir_info_counts_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("a.bin"), vec![0u8; 10]).unwrap();
        std::fs::write(tmp.path().join("nested/b.bin"), vec![0u8; 5]).unwrap();

        let info = CacheDirInfo::inspect(tmp.path());
        assert!(info.exists);
        assert_eq!(info.files, 2);
        assert_eq!(info.bytes, 15);

        let missing = CacheDirInfo::inspect(&tmp.path().join("missing"));
        assert!(!missing.exists);
        assert!(missing.describe().ends_with("(not created yet)"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GiB");
    }
}
