//! Replays stored answers for repeated generation requests.

use async_trait::async_trait;
use mimesis_core::agent::{ChatModel, GenerationRequest, ResponseCache};
use mimesis_core::error::Result;
use std::sync::Arc;

/// Wraps a chat model so identical requests are answered from a cache.
///
/// Entries are keyed by model name plus [`GenerationRequest::cache_prompt`].
/// Only successful answers are stored. A failing cache is logged and then
/// bypassed, so it never fails a generation.
pub struct CachingChatModel {
    inner: Arc<dyn ChatModel>,
    cache: Arc<dyn ResponseCache>,
}

impl CachingChatModel {
    pub fn new(inner: Arc<dyn ChatModel>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ChatModel for CachingChatModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let prompt = match request.cache_prompt() {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(error = %e, "request cannot be cached");
                return self.inner.generate(request).await;
            }
        };
        let model = request.model.clone();

        match self.cache.get(&model, &prompt).await {
            Ok(Some(answer)) => {
                tracing::debug!(%model, "response cache hit");
                return Ok(answer);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%model, error = %e, "response cache read failed"),
        }

        let answer = self.inner.generate(request).await?;
        if let Err(e) = self.cache.put(&model, &prompt, &answer).await {
            tracing::warn!(%model, error = %e, "response cache write failed");
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimesis_core::error::PersonaError;
    use mimesis_core::persona::Exchange;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersonaError::generation("provider unavailable"));
            }
            Ok(format!("answer {} to {}", n, request.question))
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<(String, String), String>>,
        broken: AtomicBool,
    }

    #[async_trait]
    impl ResponseCache for MemoryCache {
        async fn get(&self, model: &str, prompt: &str) -> Result<Option<String>> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(PersonaError::persistence("disk full"));
            }
            let entries = self.entries.lock().await;
            Ok(entries.get(&(model.to_string(), prompt.to_string())).cloned())
        }

        async fn put(&self, model: &str, prompt: &str, answer: &str) -> Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(PersonaError::persistence("disk full"));
            }
            self.entries
                .lock()
                .await
                .insert((model.to_string(), prompt.to_string()), answer.to_string());
            Ok(())
        }
    }

    fn request(model: &str, question: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: "You are Alice.".to_string(),
            history: vec![],
            question: question.to_string(),
            model: model.to_string(),
            temperature: 0.2,
        }
    }

    fn setup() -> (Arc<CountingModel>, Arc<MemoryCache>, CachingChatModel) {
        let inner = Arc::new(CountingModel::default());
        let cache = Arc::new(MemoryCache::default());
        let model = CachingChatModel::new(inner.clone(), cache.clone());
        (inner, cache, model)
    }

    #[tokio::test]
    async fn test_repeated_request_is_replayed() {
        let (inner, _cache, model) = setup();

        let first = model.generate(request("gpt-4o", "Hi")).await.unwrap();
        let second = model.generate(request("gpt-4o", "Hi")).await.unwrap();

        assert_eq!(first, "answer 1 to Hi");
        assert_eq!(second, first);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_and_history_change_the_key() {
        let (inner, _cache, model) = setup();
        model.generate(request("gpt-4o", "Hi")).await.unwrap();

        model.generate(request("gpt-3.5-turbo", "Hi")).await.unwrap();
        let mut with_history = request("gpt-4o", "Hi");
        with_history.history.push(Exchange::new("Hello", "Hey"));
        let answer = model.generate(with_history).await.unwrap();

        assert_eq!(answer, "answer 3 to Hi");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failures_are_not_stored() {
        let (inner, cache, model) = setup();
        inner.fail.store(true, Ordering::SeqCst);

        let err = model.generate(request("gpt-4o", "Hi")).await.unwrap_err();
        assert!(matches!(err, PersonaError::GenerationFailed(_)));
        assert!(cache.entries.lock().await.is_empty());

        inner.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            model.generate(request("gpt-4o", "Hi")).await.unwrap(),
            "answer 2 to Hi"
        );
    }

    #[tokio::test]
    async fn test_broken_cache_falls_through() {
        let (inner, cache, model) = setup();
        cache.broken.store(true, Ordering::SeqCst);

        model.generate(request("gpt-4o", "Hi")).await.unwrap();
        model.generate(request("gpt-4o", "Hi")).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
