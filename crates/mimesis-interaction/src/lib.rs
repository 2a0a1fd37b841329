//! Hosted-model collaborators: chat, summarization, dataset generation,
//! embeddings and retrieval.

pub mod embedding;
pub mod openai_api_agent;
pub mod retrieval;

pub use embedding::OpenAIEmbeddingAgent;
pub use openai_api_agent::{OpenAIApiAgent, ProviderError};
pub use retrieval::{chunk_text, cosine_similarity, KeywordRetriever, VectorRetriever};
