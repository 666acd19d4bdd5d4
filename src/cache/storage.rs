//! Key-value storage backends for the cache store
//!
//! The cache only needs four operations from its backing store, so the
//! storage is kept behind the [`KeyValueStore`] trait. [`FileStore`] keeps one
//! JSON file per key on disk; [`MemoryStore`] keeps everything in a map and is
//! what the tests use.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

/// Extension used for cache files written by [`FileStore`]
const FILE_EXTENSION: &str = "json";

/// Errors that can occur when writing to a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the configured storage capacity
    #[error("storage quota exceeded: {needed} bytes needed, {capacity} bytes available")]
    QuotaExceeded { needed: usize, capacity: usize },

    /// Filesystem error
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The storage lock was poisoned by a panicking writer
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Minimal string key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`
    fn read(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`; removing a missing key is a no-op
    fn remove(&self, key: &str);

    /// Lists every stored key
    fn keys(&self) -> Vec<String>;
}

/// In-memory storage with an optional byte capacity
///
/// Capacity counts the bytes of keys plus values, which is close enough to
/// how browser-style quotas behave for exercising eviction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once `capacity` bytes are used
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            capacity: Some(capacity),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;

        if let Some(capacity) = self.capacity {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if used + needed > capacity {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    capacity: capacity.saturating_sub(used),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// File-per-key storage in a directory
///
/// File names are the hex encoding of the key, so any key (including ones
/// with spaces or slashes from state and district names) maps to a valid
/// file name and can be recovered by [`KeyValueStore::keys`].
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, quota: None }
    }

    /// Limits the total size of all cache files to `quota` bytes
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(key), FILE_EXTENSION))
    }

    fn key_for(path: &Path) -> Option<String> {
        if path.extension()? != FILE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let bytes = hex::decode(stem).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Total size of stored files, not counting the file for `except`
    fn used_bytes(&self, except: &Path) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path() != except)
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len() as usize)
            .sum()
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        if let Some(quota) = self.quota {
            let used = self.used_bytes(&path);
            if used + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    capacity: quota.saturating_sub(used),
                });
            }
        }

        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove cache file");
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| Self::key_for(&entry.path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_write_read_remove() {
        let store = MemoryStore::new();
        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();

        assert_eq!(store.read("a").as_deref(), Some("1"));
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a");
        assert!(store.read("a").is_none());
        assert_eq!(store.keys(), vec!["b".to_string()]);

        // Removing again is harmless
        store.remove("a");
    }

    #[test]
    fn test_memory_store_capacity_rejects_oversized_write() {
        let store = MemoryStore::with_capacity(10);
        store.write("k", "12345").unwrap();

        let err = store.write("other", "123456").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        // Overwriting the same key does not count its old value twice
        store.write("k", "123456789").unwrap();
        assert_eq!(store.read("k").as_deref(), Some("123456789"));
    }

    #[test]
    fn test_file_store_roundtrips_keys_with_spaces() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::new(temp_dir.path().join("cache"));

        store
            .write("agmarknet_prices_Tamil Nadu_Salem", "{}")
            .expect("Write should succeed");

        assert_eq!(
            store.keys(),
            vec!["agmarknet_prices_Tamil Nadu_Salem".to_string()]
        );
        assert_eq!(
            store.read("agmarknet_prices_Tamil Nadu_Salem").as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_file_store_ignores_foreign_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("dashboard.log"), "log line").unwrap();
        fs::write(temp_dir.path().join("not-hex.json"), "{}").unwrap();

        let store = FileStore::new(temp_dir.path().to_path_buf());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_file_store_quota() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::new(temp_dir.path().to_path_buf()).with_quota(8);

        store.write("a", "1234").unwrap();
        let err = store.write("b", "12345").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        store.remove("a");
        store.write("b", "12345").unwrap();
    }

    #[test]
    fn test_file_store_read_missing_returns_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::new(temp_dir.path().join("never-created"));

        assert!(store.read("missing").is_none());
        assert!(store.keys().is_empty());
    }
}
