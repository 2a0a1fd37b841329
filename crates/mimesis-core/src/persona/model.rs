//! Persona version domain model.
//!
//! A persona version is the full state of one persona at one version date:
//! its prompt template, model settings, background corpus and running chat
//! history. Values are passed between the store and the aggregate by value;
//! every mutation produces a new value.

use crate::error::{PersonaError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for version dates (ISO 8601 calendar date).
pub const VERSION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifies a single persona version: `(name, date)`.
///
/// Dates are zero-padded ISO 8601 strings, so the lexicographic maximum is
/// the latest version. Deserialization goes through [`VersionKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawVersionKey")]
pub struct VersionKey {
    name: String,
    date: String,
}

impl VersionKey {
    /// Creates a validated key.
    ///
    /// Names become part of a file name, so path separators and a leading
    /// dot are rejected. Dates must be `YYYY-MM-DD`.
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let date = date.into();

        validate_name(&name)?;
        let parsed = NaiveDate::parse_from_str(&date, VERSION_DATE_FORMAT).map_err(|e| {
            PersonaError::invalid_input(format!("version date '{}' is not YYYY-MM-DD: {}", date, e))
        })?;
        // chrono accepts `2024-1-1`; only the padded form sorts correctly.
        if parsed.format(VERSION_DATE_FORMAT).to_string() != date {
            return Err(PersonaError::invalid_input(format!(
                "version date '{}' must be zero-padded YYYY-MM-DD",
                date
            )));
        }

        Ok(Self { name, date })
    }

    /// Creates a key for today's local date.
    pub fn today(name: impl Into<String>) -> Result<Self> {
        let date = chrono::Local::now()
            .date_naive()
            .format(VERSION_DATE_FORMAT)
            .to_string();
        Self::new(name, date)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

#[derive(Deserialize)]
struct RawVersionKey {
    name: String,
    date: String,
}

impl TryFrom<RawVersionKey> for VersionKey {
    type Error = PersonaError;

    fn try_from(raw: RawVersionKey) -> Result<Self> {
        Self::new(raw.name, raw.date)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.date)
    }
}

/// Validates a persona name for use as a storage key.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PersonaError::invalid_input("persona name cannot be empty"));
    }
    if name.starts_with('.') {
        return Err(PersonaError::invalid_input(format!(
            "persona name '{}' cannot start with '.'",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(PersonaError::invalid_input(format!(
            "persona name '{}' cannot contain path separators",
            name
        )));
    }
    Ok(())
}

/// The three prompt fragments a persona answers with.
///
/// All three are minijinja template sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System message; receives `context`, `default` and `name`
    pub system: String,
    /// Human message; receives `question`
    pub human: String,
    /// Default persona directive; receives `name`
    pub default: String,
}

/// Language-model settings stored with each version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
        }
    }
}

impl ModelConfig {
    /// Returns a copy with the model name replaced, keeping the temperature.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: self.temperature,
        }
    }
}

/// One question/answer pair in a persona's chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

impl Exchange {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
        }
    }
}

/// A persona's full state at one version date.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaVersion {
    pub key: VersionKey,
    pub description: String,
    /// Retrieval corpus for this version (seeded from the persona's dataset)
    pub background: String,
    pub embeddings_model: String,
    pub prompt: PromptTemplate,
    pub model: ModelConfig,
    pub chat_history: Vec<Exchange>,
    /// Incremented on every persist; used to detect concurrent modification
    pub revision: u64,
}

impl PersonaVersion {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn date(&self) -> &str {
        self.key.date()
    }

    /// Appends an exchange to the chat history.
    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.chat_history.push(exchange);
        self
    }

    /// Appends text to the background, separated by a newline.
    pub fn with_background_appended(mut self, text: &str) -> Self {
        if !self.background.is_empty() && !self.background.ends_with('\n') {
            self.background.push('\n');
        }
        self.background.push_str(text);
        self
    }

    /// Folds a history summary into the background and clears the history.
    pub fn with_summary_folded(self, summary: &str) -> Self {
        let mut folded = self.with_background_appended(summary);
        folded.chat_history.clear();
        folded
    }

    /// Returns a copy with the next revision number.
    pub fn next_revision(mut self) -> Self {
        self.revision += 1;
        self
    }

    /// Whether the chat history holds more exchanges than `threshold`.
    pub fn history_exceeds(&self, threshold: usize) -> bool {
        self.chat_history.len() > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersonaVersion {
        PersonaVersion {
            key: VersionKey::new("Alice", "2024-01-01").unwrap(),
            description: "A test persona".to_string(),
            background: "Born in a lighthouse.".to_string(),
            embeddings_model: "text-embedding-ada-002".to_string(),
            prompt: PromptTemplate {
                system: "{{ context }}".to_string(),
                human: "{{ question }}".to_string(),
                default: "You are {{ name }}.".to_string(),
            },
            model: ModelConfig::default(),
            chat_history: vec![],
            revision: 0,
        }
    }

    #[test]
    fn test_version_key_validation() {
        assert!(VersionKey::new("Alice", "2024-01-01").is_ok());
        assert!(VersionKey::new("snake_case_name", "2024-01-01").is_ok());
        assert!(VersionKey::new("", "2024-01-01").is_err());
        assert!(VersionKey::new("../etc", "2024-01-01").is_err());
        assert!(VersionKey::new(".hidden", "2024-01-01").is_err());
        assert!(VersionKey::new("Alice", "2024-13-01").is_err());
        assert!(VersionKey::new("Alice", "01/01/2024").is_err());
    }

    #[test]
    fn test_version_date_must_be_zero_padded() {
        assert!(VersionKey::new("Alice", "2024-1-1").is_err());
        assert!(VersionKey::new("Alice", "2024-9-30").is_err());
        assert!(VersionKey::new("Alice", "2024-09-30").is_ok());
        assert!(VersionKey::new("Alice", "+2024-09-30").is_err());
    }

    #[test]
    fn test_version_key_deserialize_validates() {
        let key: VersionKey =
            serde_json::from_str(r#"{"name":"Alice","date":"2024-01-01"}"#).unwrap();
        assert_eq!(key, VersionKey::new("Alice", "2024-01-01").unwrap());

        assert!(serde_json::from_str::<VersionKey>(r#"{"name":"../x","date":"2024-01-01"}"#).is_err());
        assert!(serde_json::from_str::<VersionKey>(r#"{"name":"Alice","date":"2024-1-1"}"#).is_err());
    }

    #[test]
    fn test_version_key_display() {
        let key = VersionKey::new("Alice", "2024-01-01").unwrap();
        assert_eq!(key.to_string(), "Alice@2024-01-01");
    }

    #[test]
    fn test_background_append_inserts_newline() {
        let version = sample().with_background_appended("Likes tea.");
        assert_eq!(version.background, "Born in a lighthouse.\nLikes tea.");
    }

    #[test]
    fn test_summary_fold_clears_history() {
        let version = sample()
            .with_exchange(Exchange::new("q1", "a1"))
            .with_exchange(Exchange::new("q2", "a2"))
            .with_summary_folded("Talked about tea.");

        assert!(version.chat_history.is_empty());
        assert!(version.background.ends_with("\nTalked about tea."));
    }

    #[test]
    fn test_history_exceeds() {
        let mut version = sample();
        for i in 0..3 {
            version = version.with_exchange(Exchange::new(format!("q{i}"), "a"));
        }
        assert!(!version.history_exceeds(3));
        version = version.with_exchange(Exchange::new("q3", "a"));
        assert!(version.history_exceeds(3));
    }
}
