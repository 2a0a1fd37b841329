//! Chain document DTO: the on-disk JSON shape of a persona version.

use serde::{Deserialize, Serialize};

use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::{Exchange, ModelConfig, PersonaVersion, PromptTemplate, VersionKey};

/// Persisted form of a persona version.
///
/// ```json
/// {
///   "character_name": "...", "model_date": "2024-01-01", "description": "...",
///   "combine_docs_chain_kwargs": { "prompt": { "system": "...", "human": "...", "default": "..." } },
///   "llm": { "model": "gpt-3.5-turbo", "temperature": 0.2 },
///   "vectorstore": { "background": "...", "embeddings_model": "text-embedding-ada-002" },
///   "memory": { "chat_history": [["query", "answer"]] },
///   "revision": 3
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDocument {
    pub character_name: String,
    pub model_date: String,
    #[serde(default)]
    pub description: String,
    pub combine_docs_chain_kwargs: CombineDocsKwargs,
    pub llm: LlmDTO,
    pub vectorstore: VectorstoreDTO,
    #[serde(default)]
    pub memory: MemoryDTO,
    #[serde(default)]
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineDocsKwargs {
    pub prompt: PromptDTO,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDTO {
    pub system: String,
    pub human: String,
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDTO {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorstoreDTO {
    #[serde(default)]
    pub background: String,
    pub embeddings_model: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDTO {
    #[serde(default)]
    pub chat_history: Vec<(String, String)>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl ChainDocument {
    /// Converts to the domain model, checking the document against the key
    /// it was stored under.
    pub fn into_domain(self, expected: &VersionKey) -> Result<PersonaVersion> {
        if self.character_name != expected.name() || self.model_date != expected.date() {
            return Err(PersonaError::corrupt(
                expected.to_string(),
                format!(
                    "document identifies as {}@{}",
                    self.character_name, self.model_date
                ),
            ));
        }

        Ok(PersonaVersion {
            key: expected.clone(),
            description: self.description,
            background: self.vectorstore.background,
            embeddings_model: self.vectorstore.embeddings_model,
            prompt: PromptTemplate {
                system: self.combine_docs_chain_kwargs.prompt.system,
                human: self.combine_docs_chain_kwargs.prompt.human,
                default: self.combine_docs_chain_kwargs.prompt.default,
            },
            model: ModelConfig {
                model: self.llm.model,
                temperature: self.llm.temperature,
            },
            chat_history: self
                .memory
                .chat_history
                .into_iter()
                .map(|(query, answer)| Exchange { query, answer })
                .collect(),
            revision: self.revision,
        })
    }
}

/// Convert domain model to ChainDocument for persistence.
impl From<&PersonaVersion> for ChainDocument {
    fn from(version: &PersonaVersion) -> Self {
        ChainDocument {
            character_name: version.name().to_string(),
            model_date: version.date().to_string(),
            description: version.description.clone(),
            combine_docs_chain_kwargs: CombineDocsKwargs {
                prompt: PromptDTO {
                    system: version.prompt.system.clone(),
                    human: version.prompt.human.clone(),
                    default: version.prompt.default.clone(),
                },
            },
            llm: LlmDTO {
                model: version.model.model.clone(),
                temperature: version.model.temperature,
            },
            vectorstore: VectorstoreDTO {
                background: version.background.clone(),
                embeddings_model: version.embeddings_model.clone(),
            },
            memory: MemoryDTO {
                chat_history: version
                    .chat_history
                    .iter()
                    .map(|e| (e.query.clone(), e.answer.clone()))
                    .collect(),
            },
            revision: version.revision,
        }
    }
}
