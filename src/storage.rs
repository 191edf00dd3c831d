//! Session-boundary persistence: the local key-value cache, the remote note
//! store and the idle-save schedule.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No entry stored for {0}")]
    NotFound(String),

    #[error("Failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse stored document {key}: {source}")]
    Parse {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("Invalid storage key {0:?}")]
    InvalidKey(String),
}

/// String values under string keys, standing in for browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Byte blobs under note paths.
pub trait RemoteStore {
    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    fn put(&mut self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reject keys that would escape the store's root directory.
fn relative_path(key: &str) -> Result<PathBuf, StorageError> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|component| matches!(component, std::path::Component::Normal(_)));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, contents).map_err(io_error)
}

/// Key-value cache keeping one file per key under a directory.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(relative_path(key)?))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        write_file(&path, value.as_bytes())
    }
}

/// Remote note store backed by a directory tree.
#[derive(Clone, Debug)]
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RemoteStore for DirRemote {
    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.root.join(relative_path(path)?);
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(source) => Err(StorageError::Io { path: full, source }),
        }
    }

    fn put(&mut self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.root.join(relative_path(path)?);
        write_file(&full, bytes)
    }
}

fn parse_document(key: &str, json: &str) -> Result<Document, StorageError> {
    Document::from_json(json).map_err(|source| StorageError::Parse {
        key: key.to_string(),
        source,
    })
}

fn encode_document(key: &str, document: &Document) -> Result<String, StorageError> {
    document.to_json().map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Cached notes live under their own prefix so a note path never shares a
/// key with other cache entries such as the dictionary.
pub const NOTE_CACHE_PREFIX: &str = "notes/";

pub fn note_cache_key(path: &str) -> String {
    format!("{NOTE_CACHE_PREFIX}{path}")
}

/// Load the note at `path`: from the cache when present, else from the
/// remote store (caching the result), else a fresh empty note.
pub fn load_document(
    cache: &mut dyn KeyValueStore,
    remote: &dyn RemoteStore,
    path: &str,
) -> Result<Document, StorageError> {
    let key = note_cache_key(path);
    match cache.get(&key)? {
        Some(cached) => match parse_document(path, &cached) {
            Ok(document) => return Ok(document),
            Err(err) => tracing::warn!("ignoring cached copy: {err}"),
        },
        None => tracing::debug!(path, "note not cached"),
    }

    let document = match remote.get(path) {
        Ok(bytes) => parse_document(path, &String::from_utf8_lossy(&bytes))?,
        Err(StorageError::NotFound(_)) => {
            tracing::debug!(path, "note not found remotely, starting empty");
            Document::empty_note()
        }
        Err(err) => {
            tracing::warn!("remote load failed, starting empty: {err}");
            Document::empty_note()
        }
    };
    cache.set(&key, &encode_document(path, &document)?)?;
    Ok(document)
}

/// Write the note to the local cache. Called on every tree change.
pub fn cache_document(
    cache: &mut dyn KeyValueStore,
    path: &str,
    document: &Document,
) -> Result<(), StorageError> {
    cache.set(&note_cache_key(path), &encode_document(path, document)?)
}

/// Push the note to the remote store.
pub fn save_document(
    remote: &mut dyn RemoteStore,
    path: &str,
    document: &Document,
) -> Result<(), StorageError> {
    let json = encode_document(path, document)?;
    remote.put(path, json.as_bytes())?;
    tracing::debug!(path, bytes = json.len(), "note saved");
    Ok(())
}

/// Debounce for remote saves: a save is due once the document has been left
/// unchanged for the whole interval.
#[derive(Clone, Debug)]
pub struct SaveScheduler {
    interval: Duration,
    last_change: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_change: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restart the idle countdown.
    pub fn mark_changed(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|changed| now.saturating_duration_since(changed) >= self.interval)
    }

    /// Clear the pending change once it has been saved.
    pub fn mark_saved(&mut self) {
        self.last_change = None;
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
