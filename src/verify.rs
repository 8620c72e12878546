//! Verification run
//!
//! Sequences every check against one configuration and records one report
//! item per check. Checks report their own failures; only errors that make
//! the run meaningless (bad device setting, unusable vector store client)
//! are returned.

use crate::assets;
use crate::checks::{self, CheckResult, ComponentContext};
use crate::config::{Config, EmbeddingConfig, VectorBackend, VectorDbConfig};
use crate::device::Device;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::report::Report;
use crate::store::{self, VectorStore};
use async_trait::async_trait;
use tracing::{debug, info};

/// Builds the heavyweight components a run needs
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    /// Load the embedding model
    async fn load_embedder(&self, config: &EmbeddingConfig) -> Result<Box<dyn Embedder>>;

    /// Construct the vector store client
    async fn open_vector_store(&self, config: &VectorDbConfig) -> Result<Box<dyn VectorStore>>;
}

/// Real components: fastembed and the configured vector store
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComponents;

#[async_trait]
impl ComponentFactory for DefaultComponents {
    #[cfg(feature = "local-embed")]
    async fn load_embedder(&self, config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
        use crate::embed::FastEmbedder;

        let spinner = crate::progress::spinner(format!("Loading embedding model {}", config.model));
        let config = config.clone();
        let loaded = tokio::task::spawn_blocking(move || FastEmbedder::new(&config))
            .await
            .map_err(|e| Error::Other(format!("Embedding model loader stopped: {}", e)));
        spinner.finish_and_clear();

        Ok(Box::new(loaded??))
    }

    #[cfg(not(feature = "local-embed"))]
    async fn load_embedder(&self, config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
        Err(Error::Embedding(format!(
            "cannot load '{}': built without the local-embed feature",
            config.model
        )))
    }

    async fn open_vector_store(&self, config: &VectorDbConfig) -> Result<Box<dyn VectorStore>> {
        store::open_store(config).await
    }
}

/// Run options taken from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Skip local LLM checks and report remote readiness instead
    pub no_local: bool,
}

pub struct Verifier<'a> {
    config: &'a Config,
    options: VerifyOptions,
    factory: &'a dyn ComponentFactory,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a Config, options: VerifyOptions, factory: &'a dyn ComponentFactory) -> Self {
        Self {
            config,
            options,
            factory,
        }
    }

    /// Run every check in order, appending to the report
    pub async fn run(&self, report: &mut Report) -> Result<()> {
        let config = self.config;
        report.push_check(CheckResult::success("config", "Configuration loaded successfully"));

        let device = Device::detect(config.device_preference()?);
        report.push_check(checks::check_device(device));

        report.push_check(checks::check_embedding_cache(config));

        let embedding = checks::check_embedding_model(self.factory, &config.embedding).await;
        report.push_check(embedding.result.clone());

        if self.options.no_local {
            report.push_check(CheckResult::skipped(
                "local_llm_skipped",
                "Skipping local LLM check (--no-local mode - will use remote inference)",
            ));
            report.push_check(CheckResult::info(
                "remote_ready",
                "Ready for remote inference providers (Ollama, DeepSeek, etc.)",
            ));
        } else {
            report.push_check(checks::check_local_llm(config));
        }

        let backend = config.vector_backend()?;
        let location = match backend {
            VectorBackend::Local => config.vector_db.path.display().to_string(),
            VectorBackend::Qdrant => config.vector_db.qdrant_url.clone(),
        };
        report.push_check(CheckResult::info(
            "vector_store_path",
            format!("Testing {} vector store at: {}", backend, location),
        ));

        let store = self.factory.open_vector_store(&config.vector_db).await?;
        report.push_check(checks::check_vector_store(store.as_ref()).await);

        let keys = assets::check_api_keys_file(&config.keys_file);
        report.push_check(checks::check_api_keys(&keys));

        for result in checks::check_cache_dirs(&assets::cache_info(config)) {
            report.push_check(result);
        }

        let summary = config
            .summary()
            .into_iter()
            .map(|(key, value)| format!("  {}: {}", key, value))
            .collect();
        report.push_section("config_summary", "📋 Configuration Summary:", summary);

        // Only hand over an embedder that passed its own smoke test
        let embedder = embedding
            .dimension
            .and(embedding.embedder.as_deref());
        let embedder_error = match embedder {
            Some(_) => None,
            None => Some(
                embedding
                    .load_error
                    .clone()
                    .unwrap_or_else(|| embedding.result.message.clone()),
            ),
        };
        debug!("Running component checks (embedder loaded: {})", embedder.is_some());

        let ctx = ComponentContext {
            config,
            device,
            no_local: self.options.no_local,
            embedder,
            embedder_error: embedder_error.as_deref(),
            store: store.as_ref(),
            keys: &keys,
        };
        let components = checks::check_rag_components(&ctx).await;
        report.push_group("components", "🧪 Testing RAG System components...", components);

        let lines = if self.options.no_local {
            vec![
                "📡 Ready for RAG demonstration with remote inference!".to_string(),
                "💡 Suggested providers: Ollama, DeepSeek".to_string(),
            ]
        } else {
            vec!["🏴‍☠️ Ready for RAG poisoning demonstration!".to_string()]
        };
        report.push_section("banner", "🎉 Setup verification successful!", lines);

        info!(
            "Verification finished with {} failed check(s)",
            report.failure_count()
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeComponents;
    use super::*;
    use crate::checks::CheckStatus;
    use crate::report::ReportItem;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.embedding.model = "test/hash".to_string();
        config.embedding.cache_dir = root.join("models/embedding");
        config.llm.model_path = root.join("models/llm/model.gguf");
        config.cache.transformers_dir = root.join("models/transformers");
        config.vector_db.backend = "local".to_string();
        config.vector_db.path = root.join("vector_db");
        config.keys_file = root.join(".keys");
        config.device = "cpu".to_string();
        config.remote.ollama_url = "http://127.0.0.1:9".to_string();
        config.remote.timeout_secs = 1;
        config.remote.deepseek_key_name = "RAGCHECK_TEST_DEEPSEEK_KEY_UNSET".to_string();
        config
    }

    async fn run(config: &Config, factory: &FakeComponents, no_local: bool) -> Report {
        let mut report = Report::new(no_local, false);
        Verifier::new(config, VerifyOptions { no_local }, factory)
            .run(&mut report)
            .await
            .unwrap();
        report
    }

    fn check<'r>(report: &'r Report, name: &str) -> &'r CheckResult {
        match report.item(name) {
            Some(ReportItem::Check(result)) => result,
            other => panic!("no check named {}: {:?}", name, other),
        }
    }

    #[tokio::test]
    async fn test_one_item_per_check_in_order() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let factory = FakeComponents::new(256);

        let report = run(&config, &factory, false).await;
        assert_eq!(
            report.names(),
            vec![
                "config",
                "device",
                "embedding_cache",
                "embedding",
                "local_llm",
                "vector_store_path",
                "vector_store",
                "api_keys",
                "embedding_cache_dir",
                "transformers_cache_dir",
                "llm_directory",
                "config_summary",
                "components",
                "banner",
            ]
        );
        assert_eq!(check(&report, "device").message, "Device detected: cpu");
        assert_eq!(
            check(&report, "embedding").message,
            "Embedding model working (dimension: 256)"
        );
        assert!(!report.has_failures(), "{}", report.render());
        assert!(report
            .render()
            .contains("🏴‍☠️ Ready for RAG poisoning demonstration!"));
    }

    #[tokio::test]
    async fn test_no_local_skips_local_llm() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let factory = FakeComponents::new(8);

        let report = run(&config, &factory, true).await;
        let names = report.names();
        assert!(!names.contains(&"local_llm"));
        assert_eq!(&names[4..6], &["local_llm_skipped", "remote_ready"]);
        assert_eq!(check(&report, "local_llm_skipped").status, CheckStatus::Skipped);
        assert_eq!(check(&report, "remote_ready").status, CheckStatus::Info);

        match report.item("components") {
            Some(ReportItem::Group { results, .. }) => {
                assert!(results.iter().all(|r| r.name != "components.local_llm"));
                assert!(results.iter().any(|r| r.name == "components.ollama"));
            }
            other => panic!("unexpected components item: {:?}", other),
        }

        let text = report.render();
        assert!(text.contains("📡 Ready for RAG demonstration with remote inference!"));
        assert!(text.contains("💡 Suggested providers: Ollama, DeepSeek"));
        assert!(!text.contains("poisoning"));
    }

    #[tokio::test]
    async fn test_failed_embedding_still_reaches_banner() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let factory = FakeComponents::new(8).with_failing_embedder();

        let report = run(&config, &factory, false).await;
        assert_eq!(report.names().len(), 14);
        assert_eq!(check(&report, "embedding").status, CheckStatus::Failure);
        assert!(check(&report, "embedding").message.contains("test/hash"));
        assert!(report.has_failures());
        assert!(report.item("banner").is_some());

        match report.item("components") {
            Some(ReportItem::Group { results, .. }) => {
                let retrieval = results
                    .iter()
                    .find(|r| r.name == "components.retrieval")
                    .unwrap();
                assert_eq!(retrieval.status, CheckStatus::Skipped);
            }
            other => panic!("unexpected components item: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeat_run_is_stable() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let factory = FakeComponents::new(12);

        let first = run(&config, &factory, false).await;
        let second = run(&config, &factory, false).await;
        assert_eq!(first.names(), second.names());
        for report in [&first, &second] {
            let result = check(report, "vector_store");
            assert!(result.is_success(), "{}", result.message);
            assert!(result.message.contains("1 record(s) in 'ragcheck_smoke'"));
        }
        assert!(factory.store_path().join("vectors.sqlite3").exists());
    }

    #[tokio::test]
    async fn test_bad_device_setting_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.device = "tpu".to_string();
        let factory = FakeComponents::new(8);

        let mut report = Report::new(false, false);
        let result = Verifier::new(&config, VerifyOptions::default(), &factory)
            .run(&mut report)
            .await;
        assert!(result.is_err());
        assert_eq!(report.names(), vec!["config"]);
    }
}
