//! Directory-backed VersionStore implementation
//!
//! One persona version = one JSON chain document, named by convention.

use crate::dto::ChainDocument;
use crate::storage::{blocking, map_atomic_error, AtomicJsonFile};
use crate::MimesisPaths;
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::{PersonaVersion, VersionKey, VersionStore};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Directory-backed persona version store.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── chain_json/
///     ├── Alice_2024-01-01.json
///     ├── Alice_2024-03-15.json
///     └── Bob_2024-01-01.json
/// ```
///
/// Names may contain `_`; file names are split at the last one, since dates
/// never contain it.
#[derive(Debug, Clone)]
pub struct DirVersionStore {
    dir: PathBuf,
}

impl DirVersionStore {
    pub fn new(paths: &MimesisPaths) -> Self {
        Self::with_dir(paths.chain_json_dir())
    }

    /// Creates a store rooted directly at `dir` (for testing).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &VersionKey) -> AtomicJsonFile<ChainDocument> {
        AtomicJsonFile::new(self.dir.join(file_name(key)))
    }

    /// Scans the directory for `(name, date)` pairs, ignoring anything that
    /// is not a well-formed chain document name.
    fn scan(dir: &Path) -> Result<Vec<VersionKey>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(key) = parse_file_name(&entry.file_name().to_string_lossy()) {
                keys.push(key);
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

/// `{name}_{date}.json`
pub fn file_name(key: &VersionKey) -> String {
    format!("{}_{}.{}", key.name(), key.date(), EXTENSION)
}

/// Parses `{name}_{date}.json`; returns `None` for lock, temp and foreign files.
pub fn parse_file_name(file_name: &str) -> Option<VersionKey> {
    let stem = file_name.strip_suffix(".json")?;
    let (name, date) = stem.rsplit_once('_')?;
    VersionKey::new(name, date).ok()
}

#[async_trait::async_trait]
impl VersionStore for DirVersionStore {
    async fn resolve_latest(&self, name: &str) -> Result<String> {
        self.list_versions(name)
            .await?
            .pop()
            .ok_or_else(|| PersonaError::not_found("persona", name))
    }

    async fn exists(&self, key: &VersionKey) -> Result<bool> {
        let path = self.file_for(key).path().to_path_buf();
        blocking(move || Ok(path.is_file())).await
    }

    async fn load(&self, key: &VersionKey) -> Result<PersonaVersion> {
        let file = self.file_for(key);
        let key = key.clone();
        blocking(move || {
            let location = file.path().display().to_string();
            let document = file
                .load()
                .map_err(|e| map_atomic_error(&location, e))?
                .ok_or_else(|| PersonaError::not_found("persona version", key.to_string()))?;
            document.into_domain(&key)
        })
        .await
    }

    async fn save(&self, version: &PersonaVersion) -> Result<()> {
        let file = self.file_for(&version.key);
        let document = ChainDocument::from(version);
        tracing::debug!(path = %file.path().display(), revision = version.revision, "saving chain document");
        blocking(move || {
            let location = file.path().display().to_string();
            file.save(&document).map_err(|e| map_atomic_error(&location, e))
        })
        .await
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.dir.clone();
        let name = name.to_string();
        blocking(move || {
            Ok(Self::scan(&dir)?
                .into_iter()
                .filter(|key| key.name() == name)
                .map(|key| key.date().to_string())
                .collect())
        })
        .await
    }

    async fn list_personas(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let dir = self.dir.clone();
        blocking(move || {
            let mut personas: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for key in Self::scan(&dir)? {
                personas
                    .entry(key.name().to_string())
                    .or_default()
                    .push(key.date().to_string());
            }
            Ok(personas)
        })
        .await
    }
}
