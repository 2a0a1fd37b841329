//! Corpus chunking and the two retriever implementations.
//!
//! [`VectorRetriever`] embeds every chunk and ranks by cosine similarity.
//! [`KeywordRetriever`] needs no provider and ranks by term overlap; it is
//! what offline setups and tests use.

use async_trait::async_trait;
use mimesis_core::agent::{Embedder, RetrievalIndex, Retriever};
use mimesis_core::error::{PersonaError, Result};
use std::cmp::Ordering;
use std::sync::Arc;

/// Splits `text` into chunks of at most `chunk_size` characters.
///
/// Paragraph and line boundaries are preferred; a single line longer than
/// `chunk_size` is split on word boundaries, and a single word longer than
/// that is cut by character count. Chunks never overlap.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let mut flush = |current: &mut String, current_len: &mut usize| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        current.clear();
        *current_len = 0;
    };

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            flush(&mut current, &mut current_len);
            continue;
        }

        for piece in split_long(line, chunk_size) {
            let piece_len = piece.chars().count();
            let sep = usize::from(current_len > 0);
            if current_len + sep + piece_len > chunk_size {
                flush(&mut current, &mut current_len);
            }
            if current_len > 0 {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }
    flush(&mut current, &mut current_len);
    chunks
}

fn split_long(line: &str, chunk_size: usize) -> Vec<String> {
    if line.chars().count() <= chunk_size {
        return vec![line.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in line.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for part in chars.chunks(chunk_size) {
            let sep = usize::from(current_len > 0);
            if current_len + sep + part.len() > chunk_size && current_len > 0 {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(part);
            current_len += part.len();
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Cosine similarity of two vectors; `0.0` when either is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x.powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x.powi(2)).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}

/// Indices of the `top_k` highest scores, ties broken by position.
fn rank(scores: &[f32], top_k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order.truncate(top_k);
    order
}

/// Embedding-backed retriever.
pub struct VectorRetriever<E: ?Sized> {
    embedder: Arc<E>,
    chunk_size: usize,
}

impl<E: Embedder + ?Sized + 'static> VectorRetriever<E> {
    pub fn new(embedder: Arc<E>, chunk_size: usize) -> Self {
        Self {
            embedder,
            chunk_size,
        }
    }
}

#[async_trait]
impl<E: Embedder + ?Sized + 'static> Retriever for VectorRetriever<E> {
    async fn build_index(
        &self,
        corpus: &str,
        embeddings_model: &str,
    ) -> Result<Box<dyn RetrievalIndex>> {
        let chunks = chunk_text(corpus, self.chunk_size);
        let vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&chunks, embeddings_model).await?
        };

        if vectors.len() != chunks.len() {
            return Err(PersonaError::generation(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        tracing::debug!(chunks = chunks.len(), model = embeddings_model, "built vector index");
        Ok(Box::new(VectorIndex {
            embedder: Arc::clone(&self.embedder),
            model: embeddings_model.to_string(),
            chunks,
            vectors,
        }))
    }
}

struct VectorIndex<E: ?Sized> {
    embedder: Arc<E>,
    model: String,
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

#[async_trait]
impl<E: Embedder + ?Sized + 'static> RetrievalIndex for VectorIndex<E> {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        if self.chunks.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()], &self.model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PersonaError::generation("embedder returned no vector for query"))?;

        let scores: Vec<f32> = self
            .vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .collect();

        Ok(rank(&scores, top_k)
            .into_iter()
            .map(|i| self.chunks[i].clone())
            .collect())
    }
}

/// Term-overlap retriever that never calls out.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    chunk_size: usize,
}

impl KeywordRetriever {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::new(500)
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn build_index(
        &self,
        corpus: &str,
        _embeddings_model: &str,
    ) -> Result<Box<dyn RetrievalIndex>> {
        let chunks = chunk_text(corpus, self.chunk_size);
        let lowered = chunks.iter().map(|c| c.to_lowercase()).collect();
        Ok(Box::new(KeywordIndex { chunks, lowered }))
    }
}

struct KeywordIndex {
    chunks: Vec<String>,
    lowered: Vec<String>,
}

fn terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

#[async_trait]
impl RetrievalIndex for KeywordIndex {
    /// With no overlapping terms the leading chunks are returned.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let terms = terms(query);
        let scores: Vec<f32> = self
            .lowered
            .iter()
            .map(|chunk| terms.iter().filter(|t| chunk.contains(t.as_str())).count() as f32)
            .collect();

        Ok(rank(&scores, top_k)
            .into_iter()
            .map(|i| self.chunks[i].clone())
            .collect())
    }
}
