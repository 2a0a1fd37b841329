//! Name-substitution filter applied to generated answers.
//!
//! Personas are modeled on real people; answers must not surface the real
//! identity, so every configured real name is replaced by its alias.

use crate::error::{PersonaError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Deterministic real-name → alias replacement.
#[derive(Debug, Clone)]
pub struct AliasFilter {
    pattern: Option<Regex>,
    aliases: BTreeMap<String, String>,
}

impl AliasFilter {
    /// Builds a filter from a fixed mapping.
    ///
    /// Longer names are matched first so that a full name wins over a
    /// shorter name it contains.
    pub fn new(aliases: BTreeMap<String, String>) -> Result<Self> {
        let mut names: Vec<&str> = aliases
            .keys()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            return Ok(Self::disabled());
        }

        names.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation)
            .map_err(|e| PersonaError::config(format!("invalid alias pattern: {}", e)))?;

        Ok(Self {
            pattern: Some(pattern),
            aliases,
        })
    }

    /// A filter that leaves text untouched.
    pub fn disabled() -> Self {
        Self {
            pattern: None,
            aliases: BTreeMap::new(),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    self.aliases
                        .get(&caps[0])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

impl Default for AliasFilter {
    fn default() -> Self {
        Self::disabled()
    }
}
