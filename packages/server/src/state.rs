//! Shared application state: the wired `ragcore` services plus the
//! agent/inbox registry, grounded on the teacher's `AxumAppState`
//! (a single `Clone` struct of `Arc`-wrapped collaborators passed via
//! `Extension`/`State`).

use std::sync::Arc;

use ragcore::crawl::{Crawler, HostLimiters, RobotsCache};
use ragcore::fetch::Fetcher;
use ragcore::inbox::PipelineExecutor;
use ragcore::pipeline::{Ingestor, RetrievalService};
use ragcore::progress::{ProgressBus, SharedProgressBus};
use ragcore::security::UrlValidator;
use ragcore::stores::{MemoryDocumentStore, MemoryVectorStore};
use ragcore::testing::MockEmbedder;
use ragcore::traits::{ChatPlatform, DocumentStore, Embedder, LlmClient, PermissionChecker, VectorStore};

use crate::adapters::chat::LoggingChatPlatform;
use crate::adapters::openai::{OpenAiConfig, OpenAiEmbedder, OpenAiLlmClient};
use crate::adapters::permission::AdminListPermissionChecker;
use crate::config::Config;
use crate::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
    pub document_store: Arc<dyn DocumentStore>,
    pub vector_store: Arc<dyn VectorStore>,
    pub ingestor: Arc<Ingestor>,
    pub retrieval: Arc<RetrievalService>,
    pub pipeline: Arc<PipelineExecutor>,
    pub permission_checker: Arc<dyn PermissionChecker>,
    pub progress: SharedProgressBus,
    pub crawler: Arc<Crawler>,
    pub fetcher: Arc<Fetcher>,
    pub url_validator: Arc<UrlValidator>,
    pub robots_cache: Arc<RobotsCache>,
}

impl AppState {
    /// Wires default, single-process collaborators: in-memory stores, a
    /// `LoggingChatPlatform`, an admin-id permission checker, and an
    /// OpenAI-compatible embedder/LLM client if `OPENAI_API_KEY` is set,
    /// falling back to a deterministic mock embedder and an echoing LLM
    /// client so the system runs end to end without external credentials.
    pub fn wire_default(config: Config) -> Self {
        let document_store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let vector_store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let permission_checker: Arc<dyn PermissionChecker> = Arc::new(AdminListPermissionChecker::new(config.admin_actor_ids.clone()));
        let chat: Arc<dyn ChatPlatform> = Arc::new(LoggingChatPlatform);

        let http_client = reqwest::Client::new();
        let (embedder, llm): (Arc<dyn Embedder>, Arc<dyn LlmClient>) = match OpenAiConfig::from_env() {
            Some(openai_config) => {
                let dimension = openai_config.embedding_dimension;
                let llm_config = OpenAiConfig {
                    api_key: openai_config.api_key.clone(),
                    base_url: openai_config.base_url.clone(),
                    embedding_model: openai_config.embedding_model.clone(),
                    chat_model: openai_config.chat_model.clone(),
                    embedding_dimension: dimension,
                };
                (
                    Arc::new(OpenAiEmbedder::new(http_client.clone(), openai_config)),
                    Arc::new(OpenAiLlmClient::new(http_client.clone(), llm_config)),
                )
            }
            None => (Arc::new(MockEmbedder::new(16)), Arc::new(ragcore::testing::MockLlmClient::new())),
        };

        let validator = Arc::new(UrlValidator::new());
        let fetcher = Arc::new(Fetcher::new(validator.clone()));
        let limiters = Arc::new(HostLimiters::default());
        let robots = Arc::new(RobotsCache::new());
        let crawler = Arc::new(Crawler::new(fetcher.clone(), limiters, robots.clone()));
        let progress = Arc::new(ProgressBus::new());

        let ingestor = Arc::new(Ingestor::new(
            document_store.clone(),
            vector_store.clone(),
            embedder.clone(),
            fetcher.clone(),
            crawler.clone(),
            progress.clone(),
        ));
        let retrieval = Arc::new(RetrievalService::new(vector_store.clone(), embedder));
        let pipeline = Arc::new(PipelineExecutor::new(retrieval.clone(), llm, chat));

        Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
            document_store,
            vector_store,
            ingestor,
            retrieval,
            pipeline,
            permission_checker,
            progress,
            crawler,
            fetcher,
            url_validator: validator,
            robots_cache: robots,
        }
    }
}
