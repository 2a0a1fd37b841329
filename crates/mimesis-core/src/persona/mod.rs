//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: Persona version value object and its key
//! - `repository`: Version store and corpus store traits
//! - `preset`: Default prompt template for new versions
//! - `request`: Persona creation request
//! - `alias`: Real-name → alias answer filter
//! - `similarity`: Near-duplicate name detection
//!
//! # Usage
//!
//! ```ignore
//! use mimesis_core::persona::{PersonaVersion, VersionKey, VersionStore};
//! ```

mod alias;
mod model;
mod preset;
mod repository;
pub mod request;
pub mod similarity;

// Re-export public API
pub use alias::AliasFilter;
pub use model::{
    validate_name, Exchange, ModelConfig, PersonaVersion, PromptTemplate, VersionKey,
    VERSION_DATE_FORMAT,
};
pub use preset::default_prompt_template;
pub use repository::{CorpusStore, VersionStore};
pub use request::CreatePersonaRequest;
