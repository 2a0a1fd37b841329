//! Wires stores, collaborators and services from an [`AppConfig`].

use crate::conversation_service::ConversationService;
use crate::persona_service::{PersonaService, PersonaSettings};
use crate::response_cache::CachingChatModel;
use crate::response_pipeline::{PipelineSettings, ResponsePipeline};
use mimesis_core::agent::{ChatModel, DatasetGenerator, ResponseCache, Retriever, Summarizer};
use mimesis_core::config::AppConfig;
use mimesis_core::dialogue::EliminationGame;
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::{AliasFilter, CorpusStore, VersionStore};
use mimesis_infrastructure::{
    ConfigService, DirCorpusStore, DirResponseCache, DirVersionStore, MimesisPaths,
};
use mimesis_interaction::{OpenAIApiAgent, OpenAIEmbeddingAgent, VectorRetriever};
use std::sync::Arc;

/// The external services a persona needs.
#[derive(Clone)]
pub struct Collaborators {
    pub chat_model: Arc<dyn ChatModel>,
    pub summarizer: Arc<dyn Summarizer>,
    pub dataset_generator: Arc<dyn DatasetGenerator>,
    pub retriever: Arc<dyn Retriever>,
}

impl Collaborators {
    /// OpenAI for everything; credentials from `secret.json` or the environment.
    pub fn openai(config: &AppConfig) -> Result<Self> {
        let agent = Arc::new(OpenAIApiAgent::try_from_env()?);
        let embedder = Arc::new(OpenAIEmbeddingAgent::from_agent(&agent));

        Ok(Self {
            chat_model: agent.clone(),
            summarizer: agent.clone(),
            dataset_generator: agent,
            retriever: Arc::new(VectorRetriever::new(embedder, config.chunk_size)),
        })
    }

    /// Answers repeated chat requests from `cache`.
    ///
    /// Summarization and dataset generation are never cached.
    pub fn with_response_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.chat_model = Arc::new(CachingChatModel::new(self.chat_model, cache));
        self
    }
}

/// Fully wired application services.
pub struct MimesisApp {
    pub config: AppConfig,
    pub personas: Arc<PersonaService>,
    pub pipeline: Arc<ResponsePipeline>,
    pub conversations: ConversationService,
}

impl MimesisApp {
    /// Loads `config.toml` and the environment, then wires the OpenAI stack.
    pub fn load() -> Result<Self> {
        let config = ConfigService::from_default_location().load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let collaborators = Collaborators::openai(&config)?;
        Self::with_collaborators(config, collaborators)
    }

    /// Directory-backed stores under the configured data directory.
    ///
    /// With `response_cache` set, chat answers are also stored under
    /// `<data_dir>/llm_cache`.
    pub fn with_collaborators(config: AppConfig, mut collaborators: Collaborators) -> Result<Self> {
        let paths = MimesisPaths::new(config.data_dir.as_deref())
            .map_err(|e| PersonaError::config(e.to_string()))?;
        tracing::debug!(data_dir = %paths.data_dir().display(), "using data directory");

        if config.response_cache {
            tracing::info!(dir = %paths.llm_cache_dir().display(), "response cache enabled");
            collaborators =
                collaborators.with_response_cache(Arc::new(DirResponseCache::new(&paths)));
        }

        let versions = Arc::new(DirVersionStore::new(&paths));
        let corpora = Arc::new(DirCorpusStore::new(&paths));
        Self::new(config, versions, corpora, collaborators)
    }

    pub fn new(
        config: AppConfig,
        versions: Arc<dyn VersionStore>,
        corpora: Arc<dyn CorpusStore>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let alias_filter = AliasFilter::new(config.aliases.clone())?;

        let personas = Arc::new(PersonaService::new(
            versions,
            corpora,
            collaborators.dataset_generator,
            collaborators.summarizer,
            PersonaSettings::from(&config),
        ));
        let pipeline = Arc::new(ResponsePipeline::new(
            personas.clone(),
            collaborators.retriever,
            collaborators.chat_model,
            alias_filter,
            PipelineSettings::from(&config),
        ));
        let conversations = ConversationService::new(
            pipeline.clone(),
            EliminationGame::new(config.elimination_max_rounds),
        );

        Ok(Self {
            config,
            personas,
            pipeline,
            conversations,
        })
    }
}
