//! Scripted collaborators and a directory-backed app for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mimesis_application::{Collaborators, MimesisApp};
use mimesis_core::agent::{ChatModel, DatasetGenerator, GenerationRequest, Summarizer};
use mimesis_core::config::AppConfig;
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::{Exchange, VersionKey};
use mimesis_interaction::KeywordRetriever;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const DATE: &str = "2024-01-01";

pub fn key(name: &str) -> VersionKey {
    VersionKey::new(name, DATE).unwrap()
}

/// Answers "I heard: {question}" unless a fixed answer is set.
#[derive(Default)]
pub struct FakeChatModel {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub answer: Mutex<Option<String>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeChatModel {
    pub fn set_answer(&self, answer: &str) {
        *self.answer.lock().unwrap() = Some(answer.to_string());
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersonaError::generation("provider unavailable"));
        }

        let answer = self
            .answer
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("I heard: {}", request.question));
        self.requests.lock().unwrap().push(request);
        Ok(answer)
    }
}

#[derive(Default)]
pub struct FakeSummarizer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, history: &[Exchange]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersonaError::summarization("provider unavailable"));
        }
        Ok(format!("Summary of {} exchanges.", history.len()))
    }
}

#[derive(Default)]
pub struct FakeDatasetGenerator {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl DatasetGenerator for FakeDatasetGenerator {
    async fn generate_dataset(&self, name: &str, description: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersonaError::dataset_generation("provider unavailable"));
        }
        Ok(format!(
            "I am {name}. {description}\n\nI live by the sea.\n\nMy dog is named Biscuit.\n"
        ))
    }
}

pub struct Harness {
    pub app: MimesisApp,
    pub chat: Arc<FakeChatModel>,
    pub summarizer: Arc<FakeSummarizer>,
    pub datasets: Arc<FakeDatasetGenerator>,
    pub temp_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(mut config: AppConfig) -> Self {
        let temp_dir = TempDir::new().unwrap();
        config.data_dir = Some(temp_dir.path().to_path_buf());

        let chat = Arc::new(FakeChatModel::default());
        let summarizer = Arc::new(FakeSummarizer::default());
        let datasets = Arc::new(FakeDatasetGenerator::default());
        let collaborators = Collaborators {
            chat_model: chat.clone(),
            summarizer: summarizer.clone(),
            dataset_generator: datasets.clone(),
            retriever: Arc::new(KeywordRetriever::new(config.chunk_size)),
        };

        let app = MimesisApp::with_collaborators(config, collaborators).unwrap();
        Self {
            app,
            chat,
            summarizer,
            datasets,
            temp_dir,
        }
    }

    /// Creates `name` at [`DATE`] with a generated dataset.
    pub async fn create(&self, name: &str) {
        self.app
            .personas
            .ensure(&key(name), None, Some("A lighthouse keeper from Maine"))
            .await
            .unwrap();
    }
}
