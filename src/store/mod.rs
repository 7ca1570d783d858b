//! Local key/value persistence.
//!
//! Every collection is stored as one JSON document under a string key. The
//! desktop builds used several key layouts over time, so a collection may
//! also live under legacy alias keys; see [`Collection`].

pub mod repository;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

pub use repository::{Entity, Repository, StoreEvent};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw storage contract. Values are JSON text.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Parsed value under `key`. Unreadable or malformed entries are logged
    /// and reported as absent.
    fn get(&self, key: &str) -> Option<Value> {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring malformed JSON under {}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

/// One `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key with a JSON value.
    pub fn with(self, key: &str, value: Value) -> Self {
        self.map().insert(key.to_string(), value.to_string());
        self
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map().get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for std::sync::Arc<S> {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

pub const SETTINGS_KEY: &str = "user-settings";
pub const API_KEY_KEY: &str = "openai-api-key";

/// Persisted collections and the keys they have been stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Notes,
    Tasks,
    Habits,
    HabitCompletions,
    Mood,
    Activities,
    Shopping,
    DailyPlan,
    BrainDump,
    Calendar,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Self::Notes,
        Self::Tasks,
        Self::Habits,
        Self::HabitCompletions,
        Self::Mood,
        Self::Activities,
        Self::Shopping,
        Self::DailyPlan,
        Self::BrainDump,
        Self::Calendar,
    ];

    /// Key the app reads and writes.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Notes => "zapiszto-notes",
            Self::Tasks => "zapiszto-tasks",
            Self::Habits => "habits",
            Self::HabitCompletions => "habit-completions",
            Self::Mood => "zapiszto-mood",
            Self::Activities => "recent-activities",
            Self::Shopping => "zapiszto-shopping-lists",
            Self::DailyPlan => "daily-plan",
            Self::BrainDump => "zapiszto-braindump",
            Self::Calendar => "zapiszto-calendar-plans",
        }
    }

    /// Keys older builds wrote.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Notes => &["notes"],
            Self::Tasks => &["tasks"],
            Self::Mood => &["mood-entries"],
            Self::Shopping => &["shopping-lists"],
            Self::DailyPlan => &["daily-plans"],
            Self::BrainDump => &["brain-dumps"],
            _ => &[],
        }
    }

    /// Canonical key first, then aliases.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.key()).chain(self.aliases().iter().copied())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Tasks => "tasks",
            Self::Habits => "habits",
            Self::HabitCompletions => "habit completions",
            Self::Mood => "mood entries",
            Self::Activities => "activities",
            Self::Shopping => "shopping lists",
            Self::DailyPlan => "daily plan",
            Self::BrainDump => "brain dump",
            Self::Calendar => "calendar",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_json_reads_as_absent() {
        let store = MemoryStore::new();
        store.set_raw("zapiszto-notes", "[{broken").unwrap();
        assert!(store.get("zapiszto-notes").is_none());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new().with("habits", json!([{"id": "1"}]));
        assert_eq!(store.get("habits"), Some(json!([{"id": "1"}])));
        store.remove("habits").unwrap();
        assert!(store.get("habits").is_none());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn keys_are_unique_across_collections() {
        let mut all: Vec<&str> = Collection::ALL.iter().flat_map(|c| c.keys()).collect();
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
        assert!(!all.contains(&SETTINGS_KEY));
    }
}
