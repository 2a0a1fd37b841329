//! Unified path management for mimesis data and configuration files.

use std::path::{Path, PathBuf};

/// Environment variable overriding the base data directory.
pub const DATA_DIR_ENV: &str = "MIMESIS_DATA_DIR";

const APP_NAME: &str = "mimesis";
const CHAIN_JSON_DIR: &str = "chain_json";
const RETRIEVAL_DATASETS_DIR: &str = "retrieval_datasets";
const LLM_CACHE_DIR: &str = "llm_cache";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved directory layout.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/mimesis/           # Config directory
/// ├── config.toml              # Application configuration
/// └── secret.json              # API keys
///
/// <data_dir>/                  # MIMESIS_DATA_DIR or ~/.local/share/mimesis
/// ├── chain_json/              # {name}_{date}.json persona versions
/// ├── retrieval_datasets/      # {name}_dataset.txt corpora
/// └── llm_cache/               # {model}/responses.json stored answers
/// ```
#[derive(Debug, Clone)]
pub struct MimesisPaths {
    data_dir: PathBuf,
}

impl MimesisPaths {
    /// Uses `base_dir` when given (tests, explicit config), otherwise the
    /// platform data directory.
    pub fn new(base_dir: Option<&Path>) -> Result<Self, PathError> {
        let data_dir = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_data_dir()?,
        };
        Ok(Self { data_dir })
    }

    /// Returns the platform data directory, e.g. `~/.local/share/mimesis`.
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the platform config directory, e.g. `~/.config/mimesis`.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn chain_json_dir(&self) -> PathBuf {
        self.data_dir.join(CHAIN_JSON_DIR)
    }

    pub fn retrieval_datasets_dir(&self) -> PathBuf {
        self.data_dir.join(RETRIEVAL_DATASETS_DIR)
    }

    pub fn llm_cache_dir(&self) -> PathBuf {
        self.data_dir.join(LLM_CACHE_DIR)
    }
}
