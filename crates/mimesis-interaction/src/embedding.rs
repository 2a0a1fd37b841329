//! Text embeddings via the OpenAI `/embeddings` endpoint.

use crate::openai_api_agent::{map_http_error, OpenAIApiAgent, DEFAULT_BASE_URL};
use async_trait::async_trait;
use mimesis_core::agent::Embedder;
use mimesis_core::error::{PersonaError, Result};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

/// Inputs per request accepted by the embeddings endpoint.
const MAX_BATCH_SIZE: usize = 100;

/// Embedding client sharing credentials with [`OpenAIApiAgent`].
#[derive(Clone)]
pub struct OpenAIEmbeddingAgent {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIEmbeddingAgent {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_agent(agent: &OpenAIApiAgent) -> Self {
        Self::new(agent.api_key()).with_base_url(agent.base_url())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        tracing::debug!("Requesting embeddings for a batch of {} texts with model {}", texts.len(), model);

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&EmbeddingRequest { model, input: texts })
            .send()
            .await
            .map_err(|e| PersonaError::generation(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(PersonaError::generation(
                map_http_error(status, error_text).to_string(),
            ));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| PersonaError::generation(format!("invalid embedding response: {e}")))?;

        into_ordered_embeddings(result, texts.len())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbeddingAgent {
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch, model).await?);
        }
        tracing::info!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Orders vectors by their `index` and checks one came back per input.
fn into_ordered_embeddings(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(PersonaError::generation(format!(
            "Embedding count mismatch: expected {}, got {}",
            expected,
            response.data.len()
        )));
    }

    let mut data = response.data;
    data.sort_by_key(|item| item.index);
    Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeddings_are_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[0.0,1.0],"index":1},{"embedding":[1.0,0.0],"index":0}],"model":"m"}"#,
        )
        .unwrap();

        let embeddings = into_ordered_embeddings(response, 2).unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_count_mismatch_is_error() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[1.0],"index":0}]}"#).unwrap();

        let err = into_ordered_embeddings(response, 3).unwrap_err();
        assert!(matches!(err, PersonaError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let agent = OpenAIEmbeddingAgent::new("sk-test").with_base_url("http://127.0.0.1:9");
        assert!(agent.embed(&[], "text-embedding-ada-002").await.unwrap().is_empty());
    }
}
