//! OpenAIApiAgent - Direct REST API implementation for OpenAI GPT.
//!
//! One agent serves as chat model, history summarizer and dataset generator.
//! Configuration priority: ~/.config/mimesis/secret.json > environment variables

use async_trait::async_trait;
use mimesis_core::agent::{ChatModel, DatasetGenerator, GenerationRequest, Summarizer};
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::Exchange;
use mimesis_infrastructure::{ConfigService, MimesisPaths};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Failure talking to the OpenAI HTTP API.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub status_code: Option<u16>,
    pub message: String,
    pub is_retryable: bool,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "OpenAI API error ({}): {}", status, self.message),
            None => write!(f, "OpenAI API error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Agent implementation that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAIApiAgent {
    /// Creates a new agent with the provided API key and model.
    ///
    /// `model` is used for summarization and dataset generation; chat
    /// generation uses the model stored with each persona version.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    /// Loads configuration from ~/.config/mimesis/secret.json or environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/mimesis/secret.json
    /// 2. Environment variables (OPENAI_API_KEY, OPENAI_MODEL_NAME)
    pub fn try_from_env() -> Result<Self> {
        if let Ok(secret_path) = MimesisPaths::secret_file() {
            if let Some(openai) = ConfigService::load_secrets(&secret_path)?.openai {
                let model = openai
                    .model_name
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into());
                return Ok(Self::new(openai.api_key, model));
            }
        }

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            PersonaError::config(
                "OPENAI_API_KEY not found in ~/.config/mimesis/secret.json or environment variables",
            )
        })?;

        let model = env::var("OPENAI_MODEL_NAME").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the utility model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Points the agent at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_request(
        &self,
        body: &ChatCompletionRequest,
    ) -> std::result::Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| ProviderError {
                status_code: None,
                message: format!("request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| ProviderError {
            status_code: None,
            message: format!("failed to parse response: {err}"),
            is_retryable: false,
        })?;

        extract_text_response(parsed)
    }

    fn utility_request(&self, system: &str, user: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIApiAgent {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        tracing::debug!(model = %request.model, history = request.history.len(), "OpenAI chat completion");
        let body = ChatCompletionRequest {
            model: request.model.clone(),
            temperature: Some(request.temperature),
            max_tokens: self.max_tokens,
            messages: build_messages(&request),
        };
        self.send_request(&body)
            .await
            .map_err(|e| PersonaError::generation(e.to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAIApiAgent {
    async fn summarize(&self, history: &[Exchange]) -> Result<String> {
        let body = self.utility_request(
            "You are a helpful assistant.",
            format!(
                "Please summarize the conversation below in one line.\n\n------------------\n{}\n------------------\n",
                format_history(history)
            ),
        );
        let summary = self
            .send_request(&body)
            .await
            .map_err(|e| PersonaError::summarization(e.to_string()))?;
        Ok(summary.trim().to_string())
    }
}

#[async_trait]
impl DatasetGenerator for OpenAIApiAgent {
    async fn generate_dataset(&self, name: &str, description: &str) -> Result<String> {
        let body = self.utility_request(
            "You write source material for fictional characters.",
            format!(
                "Create a dataset for a fictional persona named {name}.

Description: {description}

Write, in the first person as {name}:
- A backstory covering upbringing, career and notable opinions
- At least ten short dialogue examples showing how {name} talks
- Recurring phrases or habits of speech

Output plain text only."
            ),
        );
        let dataset = self
            .send_request(&body)
            .await
            .map_err(|e| PersonaError::dataset_generation(e.to_string()))?;

        if dataset.trim().is_empty() {
            return Err(PersonaError::dataset_generation(format!(
                "empty dataset returned for '{}'",
                name
            )));
        }
        Ok(dataset)
    }
}

/// System prompt, then the prior exchanges as user/assistant turns, then the question.
fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.history.len() * 2 + 2);
    messages.push(ChatMessage::system(&request.system_prompt));
    for exchange in &request.history {
        messages.push(ChatMessage::user(&exchange.query));
        messages.push(ChatMessage::assistant(&exchange.answer));
    }
    messages.push(ChatMessage::user(&request.question));
    messages
}

fn format_history(history: &[Exchange]) -> String {
    history
        .iter()
        .map(|e| format!("Q: {}\nA: {}", e.query, e.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(
    response: ChatCompletionResponse,
) -> std::result::Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError {
            status_code: None,
            message: "no content in the response".into(),
            is_retryable: false,
        })
}

pub(crate) fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ProviderError {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
    }
}
