//! External collaborator interfaces.
//!
//! Everything that talks to a hosted model lives behind these traits:
//! text generation, history summarization, dataset generation, embeddings and
//! retrieval. Implementations map their own failures into the matching
//! `PersonaError` variant. [`ResponseCache`] lets answers be replayed
//! without calling the model again.

use crate::error::Result;
use crate::persona::Exchange;
use async_trait::async_trait;
use serde::Serialize;

/// Everything a chat model needs to produce one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Fully rendered system prompt (template + retrieved context)
    pub system_prompt: String,
    /// Prior exchanges, oldest first
    pub history: Vec<Exchange>,
    /// Rendered human message
    pub question: String,
    pub model: String,
    pub temperature: f32,
}

/// Produces an answer from a prompt and chat history.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// # Returns
    ///
    /// - `Ok(String)`: The answer text
    /// - `Err(PersonaError::GenerationFailed)`: Provider error
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

impl GenerationRequest {
    /// Canonical text of everything but the model name: the same prompt,
    /// history and temperature always give the same string.
    pub fn cache_prompt(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Prompt<'a> {
            system_prompt: &'a str,
            history: &'a [Exchange],
            question: &'a str,
            temperature: f32,
        }

        Ok(serde_json::to_string(&Prompt {
            system_prompt: &self.system_prompt,
            history: &self.history,
            question: &self.question,
            temperature: self.temperature,
        })?)
    }
}

/// Answers stored per model, keyed by [`GenerationRequest::cache_prompt`].
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// # Returns
    ///
    /// - `Ok(Some(answer))`: A stored answer for this model and prompt
    /// - `Ok(None)`: Nothing stored
    async fn get(&self, model: &str, prompt: &str) -> Result<Option<String>>;

    async fn put(&self, model: &str, prompt: &str, answer: &str) -> Result<()>;
}

/// Condenses a chat history into a single line.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, history: &[Exchange]) -> Result<String>;
}

/// Writes the backstory/dialogue corpus for a new persona.
#[async_trait]
pub trait DatasetGenerator: Send + Sync {
    /// # Returns
    ///
    /// - `Ok(String)`: The generated corpus
    /// - `Err(PersonaError::DatasetGenerationFailed)`: Provider error
    async fn generate_dataset(&self, name: &str, description: &str) -> Result<String>;
}

/// Turns texts into embedding vectors, one per input, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>>;
}

/// A queryable index built from one corpus.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Returns up to `top_k` passages, most relevant first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>>;
}

/// Builds an ephemeral retrieval index over a corpus.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn build_index(
        &self,
        corpus: &str,
        embeddings_model: &str,
    ) -> Result<Box<dyn RetrievalIndex>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: "You are Alice.".to_string(),
            history: vec![Exchange::new("Hi", "Hello")],
            question: question.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
        }
    }

    #[test]
    fn test_cache_prompt_ignores_model_name() {
        let a = request("Where do you live?");
        let mut b = a.clone();
        b.model = "gpt-4o".to_string();

        assert_eq!(a.cache_prompt().unwrap(), b.cache_prompt().unwrap());
    }

    #[test]
    fn test_cache_prompt_covers_history_and_question() {
        let base = request("Where do you live?").cache_prompt().unwrap();

        assert_ne!(request("Do you have a dog?").cache_prompt().unwrap(), base);

        let mut longer = request("Where do you live?");
        longer.history.push(Exchange::new("Cats?", "Dogs."));
        assert_ne!(longer.cache_prompt().unwrap(), base);

        let mut warmer = request("Where do you live?");
        warmer.temperature = 0.9;
        assert_ne!(warmer.cache_prompt().unwrap(), base);
    }
}
