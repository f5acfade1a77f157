//! Key/value stores holding JSON values

use modsync_errors::{Error, StateError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;
    async fn set(&self, key: &str, value: Value) -> Result<(), Error>;
    async fn remove(&self, key: &str) -> Result<(), Error>;
}

/// File-backed store: one JSON object, rewritten on every change
///
/// Access is serialized through a mutex so concurrent read-modify-write
/// cycles cannot interleave.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, Error> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StateError::ReadFailed {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StateError::StateCorrupted {
                message: format!("{} does not hold a JSON object", self.path.display()),
            }
            .into()),
            Err(e) => Err(StateError::StateCorrupted {
                message: format!("{}: {e}", self.path.display()),
            }
            .into()),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<(), Error> {
        let write_failed = |e: &dyn std::fmt::Display| -> Error {
            StateError::WriteFailed {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| write_failed(&e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(map).map_err(|e| write_failed(&e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await.map_err(|e| write_failed(&e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| write_failed(&e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        if map.remove(key).is_some() {
            self.write_all(&map).await?;
        }
        Ok(())
    }
}

/// In-memory store for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_preserves_other_keys() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/state.json"));

        store.set("a", json!(1)).await.unwrap();
        store.set("b", json!(["x"])).await.unwrap();
        store.remove("a").await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some(json!(["x"])));
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get("k").await,
            Err(Error::State(StateError::StateCorrupted { .. }))
        ));
    }
}
