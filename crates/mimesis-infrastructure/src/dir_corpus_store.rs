//! Directory-backed CorpusStore implementation.

use crate::storage::{atomic_write, blocking, map_atomic_error, FileLock};
use crate::MimesisPaths;
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::{validate_name, CorpusStore};
use std::fs;
use std::path::{Path, PathBuf};

const SUFFIX: &str = "_dataset.txt";

/// Retrieval datasets, one text file per persona name.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── retrieval_datasets/
///     ├── Alice_dataset.txt
///     └── Bob_dataset.txt
/// ```
#[derive(Debug, Clone)]
pub struct DirCorpusStore {
    dir: PathBuf,
}

impl DirCorpusStore {
    pub fn new(paths: &MimesisPaths) -> Self {
        Self::with_dir(paths.retrieval_datasets_dir())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}{}", name, SUFFIX)))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl CorpusStore for DirCorpusStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        blocking(move || Ok(path.is_file())).await
    }

    async fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        let name = name.to_string();
        blocking(move || {
            read_optional(&path)?.ok_or_else(|| PersonaError::not_found("retrieval dataset", name))
        })
        .await
    }

    async fn append(&self, name: &str, text: &str) -> Result<()> {
        let path = self.path_for(name)?;
        let text = text.to_string();
        tracing::debug!(path = %path.display(), bytes = text.len(), "appending to dataset");
        blocking(move || {
            let location = path.display().to_string();
            let _lock = FileLock::acquire(&path).map_err(|e| map_atomic_error(&location, e))?;

            let mut content = read_optional(&path)?.unwrap_or_default();
            content.push_str(&text);
            atomic_write(&path, content.as_bytes()).map_err(|e| map_atomic_error(&location, e))
        })
        .await
    }

    async fn list_names(&self) -> Result<Vec<String>> {
        let dir = self.dir.clone();
        blocking(move || {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut names = Vec::new();
            for entry in entries {
                let file_name = entry?.file_name().to_string_lossy().into_owned();
                if let Some(name) = file_name.strip_suffix(SUFFIX) {
                    if validate_name(name).is_ok() {
                        names.push(name.to_string());
                    }
                }
            }
            names.sort();
            Ok(names)
        })
        .await
    }
}
