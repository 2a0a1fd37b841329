//! Persistence interfaces for persona versions and retrieval datasets.

use super::model::{PersonaVersion, VersionKey};
use crate::error::Result;
use std::collections::BTreeMap;

/// Maps `(name, date)` to a persona version document.
///
/// # Implementation Notes
///
/// - At most one document per key; `save` overwrites.
/// - `save` must never expose a half-written document to readers.
/// - Version dates are returned in ascending order without duplicates.
#[async_trait::async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns the latest version date for `name`.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The lexicographically greatest stored date
    /// - `Err(PersonaError::NotFound)`: No version exists for `name`
    async fn resolve_latest(&self, name: &str) -> Result<String>;

    /// Whether a document exists for `key`.
    async fn exists(&self, key: &VersionKey) -> Result<bool>;

    /// Loads the document stored for `key`.
    ///
    /// # Returns
    ///
    /// - `Err(PersonaError::NotFound)`: No document for `key`
    /// - `Err(PersonaError::CorruptData)`: The stored document cannot be parsed
    async fn load(&self, key: &VersionKey) -> Result<PersonaVersion>;

    /// Persists `version` under its own key, replacing any previous document.
    async fn save(&self, version: &PersonaVersion) -> Result<()>;

    /// Lists the version dates stored for `name`, ascending.
    async fn list_versions(&self, name: &str) -> Result<Vec<String>>;

    /// Groups every stored version date by persona name.
    async fn list_personas(&self) -> Result<BTreeMap<String, Vec<String>>>;
}

/// One free-text retrieval corpus per persona name.
#[async_trait::async_trait]
pub trait CorpusStore: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Loads the corpus for `name`; `NotFound` if none was generated yet.
    async fn load(&self, name: &str) -> Result<String>;

    /// Appends `text` to the corpus, creating it when absent.
    async fn append(&self, name: &str, text: &str) -> Result<()>;

    /// Lists the names that own a corpus.
    async fn list_names(&self) -> Result<Vec<String>>;
}
