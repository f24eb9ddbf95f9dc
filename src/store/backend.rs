use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt persisted state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Whole-collection persistence slot. One document per deployment; every
/// mutation rewrites the full payload. Collections are expected to stay in
/// the tens to low hundreds of orders.
pub trait StorageBackend: Send + Sync {
    /// Returns the persisted payload, or `None` when nothing has been saved.
    fn load(&self) -> Result<Option<String>, PersistenceError>;

    fn save(&self, payload: &str) -> Result<(), PersistenceError>;
}

/// Backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    slot: RwLock<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.slot.read().unwrap().clone())
    }

    fn save(&self, payload: &str) -> Result<(), PersistenceError> {
        *self.slot.write().unwrap() = Some(payload.to_string());
        Ok(())
    }
}

/// Single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, payload: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, payload)?;
        Ok(())
    }
}
