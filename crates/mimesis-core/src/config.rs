use crate::persona::ModelConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Application configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for chain documents and retrieval datasets
    pub data_dir: Option<PathBuf>,
    /// Model settings for newly created versions
    pub default_model: ModelConfig,
    pub embeddings_model: String,
    /// Exchanges kept before the history is summarized into the background
    pub history_threshold: usize,
    pub retrieval_top_k: usize,
    /// Corpus chunk size in characters
    pub chunk_size: usize,
    pub collaborator_timeout_secs: u64,
    pub elimination_max_rounds: usize,
    /// Max edit distance at which a new name counts as an existing persona
    pub similarity_distance: usize,
    /// Real identifier → alias, applied to every answer
    pub aliases: BTreeMap<String, String>,
    /// Replay stored answers for identical requests instead of calling the model
    pub response_cache: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_model: ModelConfig::default(),
            embeddings_model: "text-embedding-ada-002".to_string(),
            history_threshold: 3,
            retrieval_top_k: 4,
            chunk_size: 500,
            collaborator_timeout_secs: 60,
            elimination_max_rounds: 64,
            similarity_distance: 1,
            aliases: BTreeMap::new(),
            response_cache: false,
        }
    }
}

/// Root structure of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<OpenAIConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            history_threshold = 5

            [aliases]
            "John Smith" = "Mr. Lighthouse"
            "#,
        )
        .unwrap();

        assert_eq!(config.history_threshold, 5);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.default_model.model, "gpt-3.5-turbo");
        assert_eq!(config.aliases["John Smith"], "Mr. Lighthouse");
        assert!(!config.response_cache);
    }
}
