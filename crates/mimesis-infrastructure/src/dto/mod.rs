//! Persisted representations of domain models.

mod chain;

pub use chain::{
    ChainDocument, CombineDocsKwargs, LlmDTO, MemoryDTO, PromptDTO, VectorstoreDTO,
};
