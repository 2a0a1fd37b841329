//! Directory-backed ResponseCache implementation.

use crate::storage::{atomic_write, blocking, map_atomic_error, AtomicJsonFile, FileLock};
use crate::MimesisPaths;
use mimesis_core::agent::ResponseCache;
use mimesis_core::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const RESPONSES_FILE: &str = "responses.json";

/// Stored answers, one directory per model.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── llm_cache/
///     ├── gpt-3.5-turbo/
///     │   └── responses.json
///     └── ft_gpt-4o_acme/
///         └── responses.json
/// ```
///
/// Each `responses.json` maps a canonical prompt to its answer.
#[derive(Debug, Clone)]
pub struct DirResponseCache {
    dir: PathBuf,
}

type Responses = BTreeMap<String, String>;

impl DirResponseCache {
    pub fn new(paths: &MimesisPaths) -> Self {
        Self::with_dir(paths.llm_cache_dir())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, model: &str) -> AtomicJsonFile<Responses> {
        AtomicJsonFile::new(self.dir.join(model_dir_name(model)).join(RESPONSES_FILE))
    }
}

/// Turns a model name into a single safe path segment.
///
/// Fine-tuned model ids contain `:` and some providers use `/`.
pub fn model_dir_name(model: &str) -> String {
    let name: String = model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "_".to_string()
    } else if let Some(rest) = name.strip_prefix('.') {
        format!("_{}", rest)
    } else {
        name
    }
}

#[async_trait::async_trait]
impl ResponseCache for DirResponseCache {
    async fn get(&self, model: &str, prompt: &str) -> Result<Option<String>> {
        let file = self.file_for(model);
        let prompt = prompt.to_string();
        blocking(move || {
            let location = file.path().display().to_string();
            let responses = file.load().map_err(|e| map_atomic_error(&location, e))?;
            Ok(responses.and_then(|mut r| r.remove(&prompt)))
        })
        .await
    }

    async fn put(&self, model: &str, prompt: &str, answer: &str) -> Result<()> {
        let file = self.file_for(model);
        let prompt = prompt.to_string();
        let answer = answer.to_string();
        tracing::debug!(path = %file.path().display(), "storing cached response");
        blocking(move || {
            let location = file.path().display().to_string();
            let _lock = FileLock::acquire(file.path()).map_err(|e| map_atomic_error(&location, e))?;

            let mut responses = file
                .load()
                .map_err(|e| map_atomic_error(&location, e))?
                .unwrap_or_default();
            responses.insert(prompt, answer);
            let json = serde_json::to_string_pretty(&responses)?;
            atomic_write(file.path(), json.as_bytes()).map_err(|e| map_atomic_error(&location, e))
        })
        .await
    }
}
