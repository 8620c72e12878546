//! Remote inference readiness probes

use crate::assets::KeysFileStatus;
use crate::config::RemoteConfig;
use crate::error::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

/// Result of probing an Ollama server
#[derive(Debug, Clone, Serialize)]
pub struct OllamaStatus {
    pub url: String,
    pub reachable: bool,
    pub models: Vec<String>,
    pub error: Option<String>,
}

/// Probes the remote providers the demo can fall back to
pub struct RemoteProbe {
    client: Client,
    config: RemoteConfig,
}

impl RemoteProbe {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Ask Ollama for its installed models
    pub async fn ollama(&self) -> OllamaStatus {
        let url = self.config.ollama_url.trim_end_matches('/').to_string();
        let endpoint = format!("{}/api/tags", url);
        debug!("Probing Ollama at {}", endpoint);

        match self.fetch_tags(&endpoint).await {
            Ok(tags) => OllamaStatus {
                url,
                reachable: true,
                models: tags.models.into_iter().map(|m| m.name).collect(),
                error: None,
            },
            Err(e) => OllamaStatus {
                url,
                reachable: false,
                models: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    async fn fetch_tags(&self, endpoint: &str) -> Result<OllamaTags> {
        let tags = self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<OllamaTags>()
            .await?;
        Ok(tags)
    }

    /// Whether the DeepSeek key is available from the key file or environment
    pub fn deepseek_key_configured(&self, keys: &KeysFileStatus) -> bool {
        let name = &self.config.deepseek_key_name;
        keys.has_key(name)
            || std::env::var(name)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
    }

    pub fn deepseek_key_name(&self) -> &str {
        &self.config.deepseek_key_name
    }
}
