//! Application layer for MIMESIS.
//!
//! This crate provides the use cases that coordinate the domain model,
//! the directory-backed stores and the hosted-model collaborators:
//! persona lifecycle, the response pipeline and scripted conversations.
//! Generation can optionally replay stored answers through a response cache.

pub mod bootstrap;
mod collaborator;
pub mod conversation_service;
pub mod key_lock;
pub mod persona_service;
pub mod prompt;
pub mod response_cache;
pub mod response_pipeline;

pub use bootstrap::{Collaborators, MimesisApp};
pub use conversation_service::{ConversationService, ScriptLine};
pub use key_lock::KeyedLocks;
pub use persona_service::{CreateOutcome, EnsureOutcome, PersonaService, PersonaSettings};
pub use prompt::{PromptRenderer, RenderedPrompt};
pub use response_cache::CachingChatModel;
pub use response_pipeline::{PipelineSettings, ResponsePipeline};
