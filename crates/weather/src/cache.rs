//! Time-boxed weather memo over a pluggable key-value store.
//!
//! Entries are stored as `{"data": <record>, "timestamp": <epoch ms>}` and
//! read back only while younger than [`FRESHNESS`]. Stale or unreadable
//! entries behave exactly like a missing one.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use homepage_core::types::EpochMillis;
use homepage_core::weather::WeatherRecord;
use serde::{Deserialize, Serialize};

/// How long a resolved record is served from cache.
pub const FRESHNESS: Duration = Duration::from_secs(15 * 60);

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: String) -> io::Result<()> {
        std::fs::write(self.path_for(key), value)
    }
}

// ---------------------------------------------------------------------------
// Weather cache
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    data: WeatherRecord,
    timestamp: EpochMillis,
}

/// Weather records keyed by [`cache_key`](homepage_core::weather::cache_key).
pub struct WeatherCache<S> {
    store: S,
    freshness: Duration,
}

impl<S: KeyValueStore> WeatherCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_freshness(store, FRESHNESS)
    }

    pub fn with_freshness(store: S, freshness: Duration) -> Self {
        Self { store, freshness }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The cached record for `key` if it was written less than the
    /// freshness window before `now`.
    pub fn get_fresh(&self, key: &str, now: EpochMillis) -> Option<WeatherRecord> {
        let raw = self.store.get(key)?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Ignoring unreadable weather cache entry");
                return None;
            }
        };
        let age = now.saturating_sub(entry.timestamp);
        if age >= 0 && (age as u128) < self.freshness.as_millis() {
            Some(entry.data)
        } else {
            None
        }
    }

    /// Store `record` stamped with `now`. Write failures are logged only.
    pub fn put(&self, key: &str, record: &WeatherRecord, now: EpochMillis) {
        let entry = CacheEntry { data: record.clone(), timestamp: now };
        let result = serde_json::to_string(&entry)
            .map_err(io::Error::from)
            .and_then(|raw| self.store.set(key, raw));
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Failed to write weather cache entry");
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
