//! Individual setup checks
//!
//! Every check returns a [`CheckResult`]; failures inside a check are
//! reported, not propagated.

pub mod components;
pub mod embedding;
pub mod vector_store;

pub use components::*;
pub use embedding::*;
pub use vector_store::*;

use crate::assets::{self, CacheInfo, KeysFileStatus};
use crate::config::Config;
use crate::device::Device;
use crate::llm;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome severity of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Warning,
    Failure,
    Skipped,
    Info,
}

impl CheckStatus {
    /// Console marker printed in front of the message
    pub fn marker(&self) -> &'static str {
        match self {
            CheckStatus::Success => "✅",
            CheckStatus::Warning => "⚠️",
            CheckStatus::Failure => "❌",
            CheckStatus::Skipped => "⏭️",
            CheckStatus::Info => "ℹ️",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Success => write!(f, "success"),
            CheckStatus::Warning => write!(f, "warning"),
            CheckStatus::Failure => write!(f, "failure"),
            CheckStatus::Skipped => write!(f, "skipped"),
            CheckStatus::Info => write!(f, "info"),
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Success, message)
    }

    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warning, message)
    }

    pub fn failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Failure, message)
    }

    pub fn skipped(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Skipped, message)
    }

    pub fn info(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Info, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == CheckStatus::Failure
    }

    /// Console rendering
    pub fn render(&self) -> String {
        format!("{} {}", self.status.marker(), self.message)
    }
}

pub fn check_device(device: Device) -> CheckResult {
    CheckResult::success("device", format!("Device detected: {}", device))
}

/// Embedding models are always local, so their cache is always checked
pub fn check_embedding_cache(config: &Config) -> CheckResult {
    let model = &config.embedding.model;
    if assets::embedding_model_cached(model, &config.embedding.cache_dir) {
        CheckResult::success(
            "embedding_cache",
            format!("Local embedding model found: {}", model),
        )
    } else {
        CheckResult::warning(
            "embedding_cache",
            format!("Local embedding model not found, may need to download: {}", model),
        )
    }
}

pub fn check_local_llm(config: &Config) -> CheckResult {
    let path = &config.llm.model_path;
    if llm::local_model_exists(path) {
        CheckResult::success("local_llm", format!("Local LLM found at {}", path.display()))
    } else {
        CheckResult::warning(
            "local_llm",
            format!("Local LLM not found at {} (optional for demo)", path.display()),
        )
    }
}

pub fn check_api_keys(keys: &KeysFileStatus) -> CheckResult {
    let file = keys.path.display();
    if !keys.exists {
        return CheckResult::warning(
            "api_keys",
            format!(
                "API Keys file ({}) not found. Create this file to store your API keys.",
                file
            ),
        );
    }

    if keys.keys.is_empty() {
        CheckResult::warning(
            "api_keys",
            format!("API Keys file ({}) found but defines no keys", file),
        )
    } else {
        CheckResult::success(
            "api_keys",
            format!("API Keys file ({}) found: {}", file, keys.keys.join(", ")),
        )
    }
}

/// One line per cache directory: embedding cache, transformers cache, LLM directory
pub fn check_cache_dirs(info: &CacheInfo) -> Vec<CheckResult> {
    [
        ("embedding_cache_dir", "Embedding cache", &info.embedding_cache),
        ("transformers_cache_dir", "Transformers cache", &info.transformers_cache),
        ("llm_directory", "LLM directory", &info.llm_directory),
    ]
    .into_iter()
    .map(|(name, label, dir)| {
        let message = format!("{}: {}", label, dir.describe());
        if dir.exists {
            CheckResult::success(name, message)
        } else {
            CheckResult::warning(name, message)
        }
    })
    .collect()
}
