//! Persona creation request model.

use serde::{Deserialize, Serialize};

use super::model::{validate_name, ModelConfig};
use crate::error::{PersonaError, Result};

/// Request to create a new persona from a free-text description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePersonaRequest {
    /// Name of the public figure the persona is modeled on
    #[serde(default)]
    pub name: Option<String>,

    /// Description fed to the dataset generator (min 10 chars)
    pub description: String,

    /// Model settings for the first version; configured defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

impl CreatePersonaRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: description.into(),
            model: None,
        }
    }

    /// Validate the request and return the persona name.
    pub fn validate(&self) -> Result<&str> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| PersonaError::invalid_input("a persona name is required"))?;
        validate_name(name)?;

        if self.description.trim().chars().count() < 10 {
            return Err(PersonaError::invalid_input(
                "description must be at least 10 characters long",
            ));
        }

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_success() {
        let req = CreatePersonaRequest::new("Alice", "A lighthouse keeper from Maine");
        assert_eq!(req.validate().unwrap(), "Alice");
    }

    #[test]
    fn test_validate_missing_name() {
        let req = CreatePersonaRequest {
            name: None,
            description: "A lighthouse keeper from Maine".to_string(),
            model: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_short_description() {
        let req = CreatePersonaRequest::new("Alice", "short");
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("at least 10 characters"));
    }

    #[test]
    fn test_deserialize_without_model() {
        let req: CreatePersonaRequest =
            serde_json::from_str(r#"{"name":"Bob","description":"Retired astronaut"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Bob"));
        assert!(req.model.is_none());
    }
}
