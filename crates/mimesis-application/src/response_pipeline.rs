//! Retrieval-augmented answering in a persona's voice.

use crate::collaborator::{bounded, Collaborator};
use crate::persona_service::PersonaService;
use crate::prompt::PromptRenderer;
use mimesis_core::agent::{ChatModel, GenerationRequest, Retriever};
use mimesis_core::config::AppConfig;
use mimesis_core::error::Result;
use mimesis_core::persona::{AliasFilter, Exchange, PersonaVersion, VersionKey};
use std::sync::Arc;
use std::time::Duration;

/// Settings the pipeline takes from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// History length above which it is summarized into the background
    pub history_threshold: usize,
    pub retrieval_top_k: usize,
    pub collaborator_timeout: Duration,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_threshold: config.history_threshold,
            retrieval_top_k: config.retrieval_top_k,
            collaborator_timeout: Duration::from_secs(config.collaborator_timeout_secs),
        }
    }
}

/// Answers queries as a persona and records the exchange.
///
/// The version lock is held only while reading and writing the document.
/// Retrieval, generation and summarization run without it; afterwards the
/// document is reloaded and its `revision` compared with the snapshot the
/// answer was based on, so a concurrent writer's changes are kept.
pub struct ResponsePipeline {
    personas: Arc<PersonaService>,
    retriever: Arc<dyn Retriever>,
    chat_model: Arc<dyn ChatModel>,
    alias_filter: AliasFilter,
    renderer: PromptRenderer,
    settings: PipelineSettings,
}

impl ResponsePipeline {
    pub fn new(
        personas: Arc<PersonaService>,
        retriever: Arc<dyn Retriever>,
        chat_model: Arc<dyn ChatModel>,
        alias_filter: AliasFilter,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            personas,
            retriever,
            chat_model,
            alias_filter,
            renderer: PromptRenderer::new(),
            settings,
        }
    }

    pub fn personas(&self) -> &Arc<PersonaService> {
        &self.personas
    }

    /// Answers `query` as the persona version `key`.
    ///
    /// The version is created from the persona's dataset when absent.
    /// `model_override` replaces the stored model for this call only.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no version and no dataset exist for the persona
    /// - `GenerationFailed`: retrieval, prompt rendering or generation failed
    ///   or timed out; nothing is persisted
    /// - `PersistenceFailed` / `CorruptData`: the document could not be
    ///   read or written
    #[tracing::instrument(skip(self, key, query), fields(key = %key))]
    pub async fn respond(
        &self,
        key: &VersionKey,
        query: &str,
        model_override: Option<&str>,
    ) -> Result<String> {
        let snapshot = {
            let _guard = self.personas.lock(key).await;
            self.personas
                .ensure_locked(key, None, None)
                .await?
                .into_version()
        };

        let answer = self
            .generate(&snapshot, query, model_override)
            .await
            .map_err(|e| e.into_generation_failure())?;
        let answer = self.alias_filter.apply(&answer);
        let exchange = Exchange::new(query, answer.clone());

        let mut summarized = snapshot.chat_history.clone();
        summarized.push(exchange.clone());
        let summary = if summarized.len() > self.settings.history_threshold {
            match self.personas.summarize(&summarized).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!(error = %e, "summarization failed, keeping history");
                    None
                }
            }
        } else {
            None
        };

        let _guard = self.personas.lock(key).await;
        let current = self.personas.load(key).await?;
        if current.revision != snapshot.revision {
            tracing::warn!(
                expected = snapshot.revision,
                found = current.revision,
                "concurrent modification, applying exchange to latest revision"
            );
        }

        let mut updated = current.with_exchange(exchange);
        if let Some(summary) = summary {
            // Only fold when the history is exactly what was summarized.
            if updated.chat_history == summarized {
                updated = updated.with_summary_folded(&summary);
                tracing::info!("history summarized into background");
            }
        }

        let saved = self.personas.persist(updated).await?;
        tracing::debug!(
            revision = saved.revision,
            history = saved.chat_history.len(),
            "exchange recorded"
        );
        Ok(answer)
    }

    /// Answers as the latest version of `name`.
    pub async fn respond_latest(&self, name: &str, query: &str) -> Result<String> {
        let key = self.personas.latest_key(name).await?;
        self.respond(&key, query, None).await
    }

    async fn generate(
        &self,
        version: &PersonaVersion,
        query: &str,
        model_override: Option<&str>,
    ) -> Result<String> {
        let limit = self.settings.collaborator_timeout;

        let passages = bounded(Collaborator::Retrieval, limit, async {
            let index = self
                .retriever
                .build_index(&version.background, &version.embeddings_model)
                .await?;
            index.search(query, self.settings.retrieval_top_k).await
        })
        .await?;

        let prompt = self
            .renderer
            .render(&version.prompt, version.name(), &passages, query)?;

        let model = match model_override {
            Some(model) => version.model.with_model(model),
            None => version.model.clone(),
        };

        let request = GenerationRequest {
            system_prompt: prompt.system,
            history: version.chat_history.clone(),
            question: prompt.question,
            model: model.model,
            temperature: model.temperature,
        };

        bounded(Collaborator::Generation, limit, self.chat_model.generate(request)).await
    }
}
