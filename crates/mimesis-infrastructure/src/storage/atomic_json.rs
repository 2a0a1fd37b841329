//! Atomic file operations with file locking.
//!
//! Writers never touch the target file in place: content goes to a scoped
//! temporary file in the same directory, is fsynced, then renamed over the
//! target. Readers see either the old or the new document, never a partial one.

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic file operations.
#[derive(Debug)]
pub enum AtomicFileError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicFileError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicFileError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicFileError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicFileError {}

impl From<std::io::Error> for AtomicFileError {
    fn from(e: std::io::Error) -> Self {
        AtomicFileError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicFileError {
    fn from(e: serde_json::Error) -> Self {
        AtomicFileError::JsonError(e)
    }
}

/// Writes `bytes` to `path` via temporary file + fsync + atomic rename.
///
/// The temporary file is removed automatically if any step fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), AtomicFileError> {
    let parent = path.parent().ok_or_else(|| {
        AtomicFileError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;
    fs::create_dir_all(parent)?;

    let mut tmp_file = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp_file.write_all(bytes)?;
    tmp_file.as_file().sync_all()?;

    tmp_file
        .persist(path)
        .map_err(|e| AtomicFileError::IoError(e.error))?;
    Ok(())
}

/// A handle to a JSON document written atomically.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist
    /// - `Err`: Failed to read or parse the file (an empty file is a parse error)
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Serializes `data` and replaces the document atomically.
    ///
    /// Holds the exclusive file lock for the duration of the write so that
    /// cooperating processes serialize their writers.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        let json = serde_json::to_string_pretty(data)?;
        let _lock = FileLock::acquire(&self.path)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

/// An exclusive advisory lock guard, released when dropped.
///
/// The lock lives on a sibling `<file>.lock`, never on the data file itself,
/// because the data file is replaced by rename on every write.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks until the exclusive lock for `path` is held.
    pub fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = lock_path_for(path);

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()
            .map_err(|e| AtomicFileError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Returns `<path>.lock`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestDoc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestDoc>::new(temp_dir.path().join("doc.json"));

        let doc = TestDoc {
            name: "test".to_string(),
            count: 42,
        };
        file.save(&doc).unwrap();

        assert_eq!(file.load().unwrap(), Some(doc));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestDoc>::new(temp_dir.path().join("missing.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_garbage_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();

        let file = AtomicJsonFile::<TestDoc>::new(path);
        assert!(matches!(file.load(), Err(AtomicFileError::JsonError(_))));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("doc.json");
        let file = AtomicJsonFile::<TestDoc>::new(path.clone());

        for count in 0..3 {
            file.save(&TestDoc {
                name: "test".to_string(),
                count,
            })
            .unwrap();
        }

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "found temp files: {:?}", leftovers);
        assert_eq!(file.load().unwrap().unwrap().count, 2);
    }

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path_for(Path::new("/data/A_2024-01-01.json")),
            PathBuf::from("/data/A_2024-01-01.json.lock")
        );
    }
}
