//! Domain layer for MIMESIS.
//!
//! Persona versions and their storage contracts, the external collaborator
//! traits, and the multi-persona turn-taking primitives. Nothing in this crate
//! touches the filesystem or the network.

pub mod agent;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod persona;

// Re-export common error type
pub use error::{PersonaError, Result};
