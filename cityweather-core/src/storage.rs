//! Durable key-value storage for store state.
//!
//! Values are JSON documents addressed by short string keys. Loading never
//! fails: a missing key and a value that does not parse both read as `None`.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::error::StorageError;

pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if it is unset or not valid JSON.
    fn load(&self, key: &str) -> Option<Value>;

    /// Write `value` under `key`, replacing any previous value.
    fn store(&mut self, key: &str, value: &Value) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn parse_stored(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "Ignoring stored value that is not valid JSON");
            None
        }
    }
}

/// Directory-backed storage: each key lives in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn load(&self, key: &str) -> Option<Value> {
        validate_key(key).ok()?;
        let path = self.key_path(key);

        match fs::read_to_string(&path) {
            Ok(raw) => parse_stored(key, &raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read value");
                None
            }
        }
    }

    fn store(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        validate_key(key)?;

        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.key_path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        let body = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;

        fs::write(&tmp, body).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Stored value");
        Ok(())
    }
}

/// In-process storage holding raw strings, with an optional byte quota
/// across all stored values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Seed a raw value without any validation, e.g. text that is not JSON.
    pub fn insert_raw(&mut self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.insert(key.into(), raw.into());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn load(&self, key: &str) -> Option<Value> {
        self.entries.get(key).and_then(|raw| parse_stored(key, raw))
    }

    fn store(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        validate_key(key)?;

        let body = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;

        if let Some(quota) = self.quota {
            let needed = self.used_bytes_without(key) + body.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        self.entries.insert(key.to_string(), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_storage_returns_none_for_unset_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load("history"), None);
    }

    #[test]
    fn memory_storage_ignores_invalid_json() {
        let mut storage = MemoryStorage::new();
        storage.insert_raw("history", "not valid json");

        assert_eq!(storage.load("history"), None);
    }

    #[test]
    fn memory_storage_stores_and_loads() {
        let mut storage = MemoryStorage::new();
        storage.store("darkMode", &json!(true)).unwrap();

        assert_eq!(storage.load("darkMode"), Some(json!(true)));
        assert_eq!(storage.raw("darkMode"), Some("true"));
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_previous_value() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.store("history", &json!(["Rome"])).unwrap();

        let err = storage
            .store("history", &json!(["Rome", "Berlin", "Madrid"]))
            .unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(storage.load("history"), Some(json!(["Rome"])));
    }

    #[test]
    fn quota_counts_replaced_value_once() {
        let mut storage = MemoryStorage::with_quota(6);
        storage.store("flag", &json!(false)).unwrap();
        storage.store("flag", &json!(true)).unwrap();

        assert_eq!(storage.load("flag"), Some(json!(true)));
    }

    #[test]
    fn rejects_keys_with_path_separators() {
        let mut storage = MemoryStorage::new();
        let err = storage.store("../escape", &json!(1)).unwrap_err();

        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn file_storage_creates_directory_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("state");
        let mut storage = FileStorage::new(&dir);

        storage.store("history", &json!(["Paris", "London"])).unwrap();

        assert!(dir.join("history.json").exists());
        assert!(!dir.join("history.json.tmp").exists());

        let reopened = FileStorage::new(&dir);
        assert_eq!(reopened.load("history"), Some(json!(["Paris", "London"])));
    }

    #[test]
    fn file_storage_treats_corrupt_file_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("darkMode.json"), "{oops").unwrap();

        let storage = FileStorage::new(tmp.path());
        assert_eq!(storage.load("darkMode"), None);
    }

    #[test]
    fn file_storage_reports_write_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let mut storage = FileStorage::new(&blocker);
        let err = storage.store("history", &json!([])).unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
    }
}
