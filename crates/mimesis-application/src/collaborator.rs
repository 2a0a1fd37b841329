//! Bounded calls to external collaborators.

use mimesis_core::error::{PersonaError, Result};
use std::future::Future;
use std::time::Duration;

/// Which collaborator a call goes to; decides the error a timeout becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collaborator {
    DatasetGeneration,
    Retrieval,
    Generation,
    Summarization,
}

impl Collaborator {
    fn name(self) -> &'static str {
        match self {
            Self::DatasetGeneration => "dataset generation",
            Self::Retrieval => "retrieval",
            Self::Generation => "generation",
            Self::Summarization => "summarization",
        }
    }

    fn timeout_error(self, limit: Duration) -> PersonaError {
        let message = format!("{} timed out after {}s", self.name(), limit.as_secs_f32());
        match self {
            Self::DatasetGeneration => PersonaError::dataset_generation(message),
            Self::Retrieval | Self::Generation => PersonaError::generation(message),
            Self::Summarization => PersonaError::summarization(message),
        }
    }
}

/// Runs `call`, failing with the collaborator's error variant once `limit` elapses.
pub(crate) async fn bounded<T, F>(collaborator: Collaborator, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(collaborator = collaborator.name(), ?limit, "collaborator timed out");
            Err(collaborator.timeout_error(limit))
        }
    }
}
