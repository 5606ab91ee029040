//! Key-Value Persistence
//!
//! Durable string storage for session state. Every operation returns a
//! `Result`; callers that treat persistence as best-effort log the error and
//! drop it explicitly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Storage key for the raw input text
pub const RAW_INPUT_KEY: &str = "raw-input";

/// Storage key for the JSON-encoded outputs record
pub const OUTPUTS_KEY: &str = "outputs-json";

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing a key failed
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        /// The key being accessed
        key: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store refused the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key-value store
///
/// Implementations must not block the runtime thread.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when it was never written
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write a key
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Directory-backed store, one file per key
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory (`$XDG_DATA_HOME/inklens`)
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("inklens")))
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.txt"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        // Write to a sibling temp file, then rename over the target
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err)?;
        file.write_all(value.as_bytes()).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        Ok(())
    }
}

/// In-memory store
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// was written. Writes can be switched off to exercise failure paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Seed a value directly, bypassing failure injection
    pub fn insert(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .values
            .insert(key.to_string(), value.to_string());
    }

    /// Raw stored value
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().values.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.inner.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(PersistenceError::Unavailable(format!(
                "writes disabled for '{key}'"
            )));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
