//! Cache module for storing fetched market prices locally
//!
//! This module provides a cache store that keeps one snapshot per query
//! signature with a write timestamp and a 24-hour TTL. It supports graceful
//! degradation by returning stale entries with an `is_stale` flag, allowing the
//! dashboard to show old prices when the proxy is unavailable.

mod clock;
mod manager;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{
    format_age, CacheStore, CachedData, CACHE_PREFIX, CACHE_SCHEMA_VERSION, CACHE_TTL_MILLIS,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
