//! Persona aggregate: creation, background updates and chat history.
//!
//! Every read-modify-write runs under the per-version lock, so concurrent
//! callers on the same `(name, date)` never lose each other's updates.

use crate::collaborator::{bounded, Collaborator};
use crate::key_lock::KeyedLocks;
use mimesis_core::agent::{DatasetGenerator, Summarizer};
use mimesis_core::config::AppConfig;
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::similarity::closest_match;
use mimesis_core::persona::{
    default_prompt_template, validate_name, CorpusStore, CreatePersonaRequest, Exchange,
    ModelConfig, PersonaVersion, VersionKey, VersionStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Result of [`PersonaService::ensure`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
    /// The version did not exist and was synthesized
    Created(PersonaVersion),
    /// The stored version was loaded
    Loaded(PersonaVersion),
}

impl EnsureOutcome {
    pub fn version(&self) -> &PersonaVersion {
        match self {
            Self::Created(version) | Self::Loaded(version) => version,
        }
    }

    pub fn into_version(self) -> PersonaVersion {
        match self {
            Self::Created(version) | Self::Loaded(version) => version,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of [`PersonaService::create_character`].
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// A persona with this (or a nearly identical) name already exists
    Existing(String),
    Created(PersonaVersion),
}

/// Settings the aggregate takes from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PersonaSettings {
    pub default_model: ModelConfig,
    pub embeddings_model: String,
    pub similarity_distance: usize,
    pub collaborator_timeout: Duration,
}

impl From<&AppConfig> for PersonaSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_model: config.default_model.clone(),
            embeddings_model: config.embeddings_model.clone(),
            similarity_distance: config.similarity_distance,
            collaborator_timeout: Duration::from_secs(config.collaborator_timeout_secs),
        }
    }
}

/// Owns every mutation of persona versions and retrieval datasets.
pub struct PersonaService {
    versions: Arc<dyn VersionStore>,
    corpora: Arc<dyn CorpusStore>,
    dataset_generator: Arc<dyn DatasetGenerator>,
    summarizer: Arc<dyn Summarizer>,
    version_locks: KeyedLocks<VersionKey>,
    corpus_locks: KeyedLocks<String>,
    settings: PersonaSettings,
}

impl PersonaService {
    pub fn new(
        versions: Arc<dyn VersionStore>,
        corpora: Arc<dyn CorpusStore>,
        dataset_generator: Arc<dyn DatasetGenerator>,
        summarizer: Arc<dyn Summarizer>,
        settings: PersonaSettings,
    ) -> Self {
        Self {
            versions,
            corpora,
            dataset_generator,
            summarizer,
            version_locks: KeyedLocks::new(),
            corpus_locks: KeyedLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &PersonaSettings {
        &self.settings
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn resolve_latest(&self, name: &str) -> Result<String> {
        self.versions.resolve_latest(name).await
    }

    /// Key of the latest stored version of `name`.
    pub async fn latest_key(&self, name: &str) -> Result<VersionKey> {
        let date = self.versions.resolve_latest(name).await?;
        VersionKey::new(name, date)
    }

    pub async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        self.versions.list_versions(name).await
    }

    pub async fn list_personas(&self) -> Result<BTreeMap<String, Vec<String>>> {
        self.versions.list_personas().await
    }

    pub async fn load(&self, key: &VersionKey) -> Result<PersonaVersion> {
        self.versions.load(key).await
    }

    pub async fn load_dataset(&self, name: &str) -> Result<String> {
        self.corpora.load(name).await
    }

    // ============================================================================
    // Commands
    // ============================================================================

    /// Makes sure a version exists for `key`, creating it when absent.
    ///
    /// Creation generates the persona's retrieval dataset first unless one
    /// already exists. Without a dataset a `description` is required;
    /// otherwise the persona is unknown and `NotFound` is returned.
    ///
    /// `model` only applies to a newly created version.
    pub async fn ensure(
        &self,
        key: &VersionKey,
        model: Option<&ModelConfig>,
        description: Option<&str>,
    ) -> Result<EnsureOutcome> {
        let _guard = self.lock(key).await;
        self.ensure_locked(key, model, description).await
    }

    /// Appends `text` to the background of an existing version.
    pub async fn update_background(&self, key: &VersionKey, text: &str) -> Result<PersonaVersion> {
        let _guard = self.lock(key).await;
        let current = self.versions.load(key).await?;
        let updated = self.persist(current.with_background_appended(text)).await?;
        tracing::info!(key = %key, bytes = text.len(), "background appended");
        Ok(updated)
    }

    /// Appends one exchange to the chat history of an existing version.
    pub async fn record_exchange(
        &self,
        key: &VersionKey,
        query: &str,
        answer: &str,
    ) -> Result<PersonaVersion> {
        let _guard = self.lock(key).await;
        let current = self.versions.load(key).await?;
        let updated = self
            .persist(current.with_exchange(Exchange::new(query, answer)))
            .await?;
        tracing::debug!(key = %key, history = updated.chat_history.len(), "exchange recorded");
        Ok(updated)
    }

    /// Summarizes the chat history into the background and clears it.
    ///
    /// An empty history is left untouched. The lock is held across the
    /// summarizer call.
    pub async fn summarize_history(&self, key: &VersionKey) -> Result<PersonaVersion> {
        let _guard = self.lock(key).await;
        let current = self.versions.load(key).await?;
        if current.chat_history.is_empty() {
            return Ok(current);
        }

        let summary = self.summarize(&current.chat_history).await?;
        let updated = self.persist(current.with_summary_folded(&summary)).await?;
        tracing::info!(key = %key, "history summarized");
        Ok(updated)
    }

    /// Creates a new persona unless one with a near-identical name exists.
    pub async fn create_character(
        &self,
        request: &CreatePersonaRequest,
        date: &str,
    ) -> Result<CreateOutcome> {
        let name = request.validate()?;
        let key = VersionKey::new(name, date)?;

        let existing = self.corpora.list_names().await?;
        if let Some(closest) = closest_match(
            name,
            existing.iter().map(String::as_str),
            self.settings.similarity_distance,
        ) {
            tracing::info!(requested = name, existing = closest, "persona already exists");
            return Ok(CreateOutcome::Existing(closest.to_string()));
        }

        let outcome = self
            .ensure(&key, request.model.as_ref(), Some(&request.description))
            .await?;
        Ok(CreateOutcome::Created(outcome.into_version()))
    }

    /// Appends free text to a persona's retrieval dataset.
    ///
    /// Existing versions keep their background; only versions created
    /// afterwards see the new text.
    pub async fn append_to_dataset(&self, name: &str, text: &str) -> Result<()> {
        validate_name(name)?;
        let _guard = self.corpus_locks.lock(&name.to_string()).await;
        self.corpora.append(name, text).await
    }

    // ============================================================================
    // Lock-scoped building blocks for the response pipeline
    // ============================================================================

    pub(crate) async fn lock(&self, key: &VersionKey) -> OwnedMutexGuard<()> {
        self.version_locks.lock(key).await
    }

    pub(crate) async fn ensure_locked(
        &self,
        key: &VersionKey,
        model: Option<&ModelConfig>,
        description: Option<&str>,
    ) -> Result<EnsureOutcome> {
        if self.versions.exists(key).await? {
            let version = self.versions.load(key).await?;
            tracing::debug!(key = %key, revision = version.revision, "version loaded");
            return Ok(EnsureOutcome::Loaded(version));
        }

        let previous = match self.versions.resolve_latest(key.name()).await {
            Ok(date) => Some(self.versions.load(&VersionKey::new(key.name(), date)?).await?),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        let description = description
            .map(str::to_string)
            .or_else(|| previous.as_ref().map(|v| v.description.clone()));
        let corpus = self.ensure_dataset(key.name(), description.as_deref()).await?;

        let version = PersonaVersion {
            key: key.clone(),
            description: description.unwrap_or_default(),
            background: corpus,
            embeddings_model: previous
                .as_ref()
                .map(|v| v.embeddings_model.clone())
                .unwrap_or_else(|| self.settings.embeddings_model.clone()),
            prompt: previous
                .as_ref()
                .map(|v| v.prompt.clone())
                .unwrap_or_else(default_prompt_template),
            model: model
                .cloned()
                .or_else(|| previous.as_ref().map(|v| v.model.clone()))
                .unwrap_or_else(|| self.settings.default_model.clone()),
            chat_history: Vec::new(),
            revision: 0,
        };

        let version = self.persist(version).await?;
        tracing::info!(key = %key, model = %version.model.model, "version created");
        Ok(EnsureOutcome::Created(version))
    }

    /// Saves `version` with its revision bumped and returns what was saved.
    pub(crate) async fn persist(&self, version: PersonaVersion) -> Result<PersonaVersion> {
        let version = version.next_revision();
        self.versions.save(&version).await?;
        Ok(version)
    }

    pub(crate) async fn summarize(&self, history: &[Exchange]) -> Result<String> {
        let summary = bounded(
            Collaborator::Summarization,
            self.settings.collaborator_timeout,
            self.summarizer.summarize(history),
        )
        .await?;
        Ok(summary.trim().to_string())
    }

    /// Returns the dataset for `name`, generating it on first use.
    async fn ensure_dataset(&self, name: &str, description: Option<&str>) -> Result<String> {
        let _guard = self.corpus_locks.lock(&name.to_string()).await;
        if self.corpora.exists(name).await? {
            return self.corpora.load(name).await;
        }

        let description = description.ok_or_else(|| PersonaError::not_found("persona", name))?;
        tracing::info!(name, "generating retrieval dataset");
        let dataset = bounded(
            Collaborator::DatasetGeneration,
            self.settings.collaborator_timeout,
            self.dataset_generator.generate_dataset(name, description),
        )
        .await?;

        self.corpora.append(name, &dataset).await?;
        Ok(dataset)
    }
}
