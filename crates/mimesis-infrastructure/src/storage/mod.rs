//! Storage layer for atomic file operations.

mod atomic_json;

pub use atomic_json::{atomic_write, lock_path_for, AtomicFileError, AtomicJsonFile, FileLock};

use mimesis_core::error::PersonaError;

/// Runs blocking filesystem work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> mimesis_core::Result<T>
where
    F: FnOnce() -> mimesis_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PersonaError::persistence(format!("storage task failed: {}", e)))?
}

/// Maps a storage error for `location` into the shared error type.
pub(crate) fn map_atomic_error(location: &str, err: AtomicFileError) -> PersonaError {
    match err {
        AtomicFileError::JsonError(e) => PersonaError::corrupt(location, e.to_string()),
        AtomicFileError::IoError(e) => {
            PersonaError::persistence(format!("{}: {} (kind: {:?})", location, e, e.kind()))
        }
        AtomicFileError::LockError(message) => {
            PersonaError::persistence(format!("{}: {}", location, message))
        }
    }
}
