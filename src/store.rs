//! Durable key/value persistence for session state.
//!
//! A generic JSON cell with best-effort semantics: loads fall back to a
//! caller-supplied default on any failure, writes are logged and swallowed
//! on failure. The store knows nothing about route semantics.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Raw string storage behind the JSON cell.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let dest = self.path_for(key);
        // Write through a tmp file so a crash never leaves a half-written cell.
        let tmp = dest.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, dest)?;
        Ok(())
    }
}

/// In-memory backend: the fallback when nothing durable is available, and
/// the default test backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON (de)serialization over a [`StorageBackend`].
#[derive(Debug, Clone)]
pub struct SessionStore<B> {
    backend: B,
}

impl<B: StorageBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Reads and parses the stored value, or returns `default` when the key
    /// is missing or the stored text does not parse.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.backend.read(key) else {
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "stored value did not parse, using default");
                default
            }
        }
    }

    /// Serializes and writes the value. Failures are logged and swallowed;
    /// the caller keeps running on its in-memory state.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, %err, "failed to serialize session state");
                return;
            }
        };
        if let Err(err) = self.backend.write(key, &raw) {
            warn!(key, %err, "failed to persist session state");
        }
    }
}
