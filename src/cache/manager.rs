//! Cache store for market price snapshots
//!
//! Provides a `CacheStore` that stores serializable data under a key prefix with
//! a write timestamp, reports staleness against a fixed TTL, and degrades to
//! "no cache" instead of failing when the storage misbehaves.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::storage::{FileStore, KeyValueStore};

/// Prefix for every key the cache store owns
pub const CACHE_PREFIX: &str = "agmarknet_";

/// Time-to-live after which an entry is reported stale (24 hours)
pub const CACHE_TTL_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Shape version of stored entries; entries with another version are ignored
pub const CACHE_SCHEMA_VERSION: u32 = 1;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_MINUTE: i64 = 60 * 1000;

/// Wrapper struct for cached data as it is persisted
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Stored entry shape version
    version: u32,
    /// The cached data
    data: T,
    /// When the data was cached, in epoch milliseconds
    timestamp: i64,
}

/// Only the metadata of a stored entry, used when the payload type is unknown
#[derive(Debug, Deserialize)]
struct EntryHeader {
    version: u32,
    timestamp: i64,
}

/// Result of reading from the cache, including freshness metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was stored, in epoch milliseconds
    pub stored_at: i64,
    /// Whether the entry is older than the TTL
    pub is_stale: bool,
}

/// Best-effort, single-user cache keyed by query signature
///
/// Stale entries are still returned (with `is_stale = true`) so callers can
/// fall back to them when the network is unavailable. Unreadable entries are
/// reported as misses, and write failures are logged and dropped.
pub struct CacheStore {
    storage: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    prefix: String,
    ttl_millis: i64,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("prefix", &self.prefix)
            .field("ttl_millis", &self.ttl_millis)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a cache store over the given storage, using wall-clock time
    pub fn new(storage: impl KeyValueStore + 'static) -> Self {
        Self::with_clock(storage, SystemClock)
    }

    /// Creates a cache store with a custom time source
    pub fn with_clock(storage: impl KeyValueStore + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            clock: Box::new(clock),
            prefix: CACHE_PREFIX.to_string(),
            ttl_millis: CACHE_TTL_MILLIS,
        }
    }

    /// Creates a file-backed cache store in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/mandi-prices/prices/` on Linux, or the platform
    /// equivalent, holding at most `quota` bytes of entries. Returns `None` if
    /// the cache directory cannot be determined.
    pub fn in_user_cache_dir(quota: usize) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "mandi-prices")?;
        let dir = project_dirs.cache_dir().join("prices");
        Some(Self::new(FileStore::new(dir).with_quota(quota)))
    }

    fn storage_key(&self, signature: &str) -> String {
        format!("{}{}", self.prefix, signature)
    }

    /// Reads the entry for `signature`
    ///
    /// Returns `None` when there is no entry or the entry cannot be parsed as
    /// the current schema version holding a `T`.
    pub fn get<T: DeserializeOwned>(&self, signature: &str) -> Option<CachedData<T>> {
        let key = self.storage_key(signature);
        let raw = self.storage.read(&key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "cache entry unreadable, treating as miss");
                return None;
            }
        };

        if entry.version != CACHE_SCHEMA_VERSION {
            debug!(key = %key, version = entry.version, "cache entry has foreign schema version");
            return None;
        }

        let age = self.clock.now_millis() - entry.timestamp;
        Some(CachedData {
            data: entry.data,
            stored_at: entry.timestamp,
            is_stale: age > self.ttl_millis,
        })
    }

    /// Stores `data` under `signature` with a fresh timestamp
    ///
    /// If the storage rejects the write, old entries are swept and the write is
    /// retried once. A second failure is logged and the data is not cached.
    pub fn set<T: Serialize>(&self, signature: &str, data: &T) {
        let key = self.storage_key(signature);
        let entry = CacheEntry {
            version: CACHE_SCHEMA_VERSION,
            data,
            timestamp: self.clock.now_millis(),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.storage.write(&key, &json) {
            warn!(key = %key, error = %e, "cache write failed, sweeping old entries");
            self.sweep();
            if let Err(e) = self.storage.write(&key, &json) {
                warn!(key = %key, error = %e, "cache write failed after sweep");
            }
        }
    }

    /// Removes the entry for `signature`
    pub fn invalidate(&self, signature: &str) {
        self.storage.remove(&self.storage_key(signature));
    }

    /// Removes entries older than twice the TTL, plus unreadable entries
    ///
    /// Only keys under the cache prefix are considered. Returns the number of
    /// removed entries.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let to_remove: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&self.prefix))
            .filter(|key| match self.read_header(key) {
                Some(header) => {
                    header.version != CACHE_SCHEMA_VERSION
                        || now - header.timestamp > self.ttl_millis * 2
                }
                None => true,
            })
            .collect();

        for key in &to_remove {
            self.storage.remove(key);
        }
        if !to_remove.is_empty() {
            debug!(removed = to_remove.len(), "swept old cache entries");
        }
        to_remove.len()
    }

    /// Human-readable age of the entry for `signature`, e.g. "2h 15m ago"
    pub fn age(&self, signature: &str) -> Option<String> {
        let header = self.read_header(&self.storage_key(signature))?;
        Some(format_age(self.clock.now_millis() - header.timestamp))
    }

    fn read_header(&self, key: &str) -> Option<EntryHeader> {
        let raw = self.storage.read(key)?;
        serde_json::from_str(&raw).ok()
    }
}

/// Formats an age in milliseconds as "Xh Ym ago" or "Ym ago"
pub fn format_age(age_millis: i64) -> String {
    let age = age_millis.max(0);
    let hours = age / MILLIS_PER_HOUR;
    let minutes = (age % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;

    if hours > 0 {
        format!("{}h {}m ago", hours, minutes)
    } else {
        format!("{}m ago", minutes)
    }
}
