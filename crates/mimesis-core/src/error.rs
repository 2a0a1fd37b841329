//! Error types for the Mimesis persona system.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for every Mimesis crate.
///
/// Storage, aggregate and pipeline layers surface these variants unchanged,
/// so callers can tell an unknown persona apart from a transient provider
/// failure.
#[derive(Error, Debug, Clone, Serialize)]
pub enum PersonaError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A stored document could not be parsed
    #[error("Corrupt data in {location}: {message}")]
    CorruptData { location: String, message: String },

    /// Caller supplied an unusable name, date or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The dataset generator failed to produce a corpus
    #[error("Dataset generation failed: {0}")]
    DatasetGenerationFailed(String),

    /// Retrieval or text generation failed (including timeouts)
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The summarization collaborator failed
    #[error("Summarization failed: {0}")]
    SummarizationFailed(String),

    /// IO error while reading or writing persisted state
    #[error("Persistence failed: {message}")]
    PersistenceFailed { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Turn scheduling was attempted on an empty roster
    #[error("Roster is empty")]
    EmptyRoster,

    /// The elimination round stayed undecided for the whole retry budget
    #[error("No decision reached after {rounds} rounds")]
    NoDecisionReached { rounds: usize },
}

impl PersonaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a CorruptData error
    pub fn corrupt(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptData {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates a PersistenceFailed error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceFailed {
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a GenerationFailed error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Creates a SummarizationFailed error
    pub fn summarization(message: impl Into<String>) -> Self {
        Self::SummarizationFailed(message.into())
    }

    /// Creates a DatasetGenerationFailed error
    pub fn dataset_generation(message: impl Into<String>) -> Self {
        Self::DatasetGenerationFailed(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error ("persona unknown": supply a description to create it)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a CorruptData error
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// Check if the caller may simply retry (transient provider failure).
    ///
    /// Dataset generation is excluded: it needs caller intervention
    /// (usually a better description) before another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed(_) | Self::SummarizationFailed(_)
        )
    }

    /// Folds any failure raised while answering a query into `GenerationFailed`.
    ///
    /// Errors that already carry a more precise meaning for the caller
    /// (unknown persona, storage problems) are passed through.
    pub fn into_generation_failure(self) -> Self {
        match self {
            Self::NotFound { .. }
            | Self::CorruptData { .. }
            | Self::PersistenceFailed { .. }
            | Self::GenerationFailed(_) => self,
            other => Self::GenerationFailed(other.to_string()),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PersonaError {
    fn from(err: std::io::Error) -> Self {
        Self::PersistenceFailed {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PersonaError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptData {
            location: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PersonaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A type alias for `Result<T, PersonaError>`.
pub type Result<T> = std::result::Result<T, PersonaError>;
