pub mod config_service;
pub mod dir_corpus_store;
pub mod dir_response_cache;
pub mod dir_version_store;
pub mod dto;
pub mod logging;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::dir_corpus_store::DirCorpusStore;
pub use crate::dir_response_cache::DirResponseCache;
pub use crate::dir_version_store::DirVersionStore;
pub use crate::paths::MimesisPaths;
