//! Loads `AppConfig` and `SecretConfig` from disk with environment overrides.

use crate::paths::{MimesisPaths, DATA_DIR_ENV};
use mimesis_core::config::{AppConfig, SecretConfig};
use mimesis_core::error::{PersonaError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const HISTORY_THRESHOLD_ENV: &str = "MIMESIS_HISTORY_THRESHOLD";
const TIMEOUT_ENV: &str = "MIMESIS_TIMEOUT_SECS";

/// Resolves configuration from `config.toml` and the environment.
///
/// Priority (highest first):
/// 1. Environment variables (`MIMESIS_DATA_DIR`, `MIMESIS_HISTORY_THRESHOLD`, `MIMESIS_TIMEOUT_SECS`)
/// 2. `config.toml` (explicit path, or the platform config directory)
/// 3. Built-in defaults
pub struct ConfigService {
    config_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Uses the platform config file, if the home directory can be resolved.
    pub fn from_default_location() -> Self {
        Self::new(MimesisPaths::config_file().ok())
    }

    pub fn load(&self) -> Result<AppConfig> {
        let mut config = match &self.config_path {
            Some(path) => load_toml(path)?.unwrap_or_default(),
            None => AppConfig::default(),
        };
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads `secret.json`; a missing file yields an empty config.
    pub fn load_secrets(path: &Path) -> Result<SecretConfig> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                PersonaError::config(format!(
                    "Failed to parse secret file at {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SecretConfig::default()),
            Err(e) => Err(e.into()),
        }
    }
}

fn load_toml(path: &Path) -> Result<Option<AppConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    toml::from_str(&content).map(Some).map_err(|e| {
        PersonaError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(value) = lookup(HISTORY_THRESHOLD_ENV) {
        config.history_threshold = parse_env(HISTORY_THRESHOLD_ENV, &value)?;
    }
    if let Some(value) = lookup(TIMEOUT_ENV) {
        config.collaborator_timeout_secs = parse_env(TIMEOUT_ENV, &value)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PersonaError::config(format!("{}='{}': {}", key, value, e)))
}
