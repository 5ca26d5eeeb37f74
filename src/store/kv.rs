//! Key-value maps for resource metadata

use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Minimal durable map interface
pub trait KeyValueStore<V>: Send {
    /// Fetch the value stored under `key`
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key`
    fn set(&mut self, key: &str, value: V) -> PipedbResult<()>;

    /// Whether any value was ever stored under `key`
    fn contains(&self, key: &str) -> bool;

    /// Remove `key`, returning the previous value
    fn remove(&mut self, key: &str) -> PipedbResult<Option<V>>;

    /// Flush pending writes and release the backing storage
    fn close(&mut self) -> PipedbResult<()>;
}

/// In-memory map, for tests and throwaway workflows
#[derive(Debug, Default)]
pub struct MemoryStore<V> {
    entries: HashMap<String, V>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone + Send> KeyValueStore<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: V) -> PipedbResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn remove(&mut self, key: &str) -> PipedbResult<Option<V>> {
        Ok(self.entries.remove(key))
    }

    fn close(&mut self) -> PipedbResult<()> {
        Ok(())
    }
}

/// Map persisted as one sorted JSON object
///
/// The whole map is held in memory and written back on [`KeyValueStore::close`],
/// [`JsonFileStore::flush`] or drop. Keys are kept sorted so the file is
/// deterministic for a given set of entries.
#[derive(Debug)]
pub struct JsonFileStore<V: Serialize> {
    path: PathBuf,
    entries: BTreeMap<String, V>,
    dirty: bool,
}

impl<V: Serialize + DeserializeOwned> JsonFileStore<V> {
    /// Open the store at `path`, starting empty if the file is missing
    pub fn open(path: impl Into<PathBuf>) -> PipedbResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| PipedbError::Decode {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PipedbError::io(format!("reading {}", path.display()), e)),
        };
        debug!("Opened {} with {} entries", path.display(), entries.len());
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write pending changes to disk
    pub fn flush(&mut self) -> PipedbResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let content = serde_json::to_vec_pretty(&self.entries)?;
        fsutil::write_if_different(&self.path, &content)?;
        self.dirty = false;
        debug!("Flushed {} entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

impl<V> KeyValueStore<V> for JsonFileStore<V>
where
    V: Serialize + DeserializeOwned + Clone + Send,
{
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: V) -> PipedbResult<()> {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn remove(&mut self, key: &str) -> PipedbResult<Option<V>> {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            self.dirty = true;
        }
        Ok(previous)
    }

    fn close(&mut self) -> PipedbResult<()> {
        self.flush()
    }
}

impl<V: Serialize> Drop for JsonFileStore<V> {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        let result = serde_json::to_vec_pretty(&self.entries)
            .map_err(PipedbError::from)
            .and_then(|content| fsutil::write_if_different(&self.path, &content));
        if let Err(e) = result {
            warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::<f64>::new();
        assert!(!store.contains("a"));
        store.set("a", 1.5).unwrap();
        assert_eq!(store.get("a"), Some(1.5));
        assert_eq!(store.remove("a").unwrap(), Some(1.5));
        assert!(store.get("a").is_none());
    }

    #[test]
    fn json_store_persists_on_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("createtimes.json");

        let mut store = JsonFileStore::<f64>::open(&path).unwrap();
        assert!(store.is_empty());
        store.set("out@/sample/A", 12.25).unwrap();
        store.close().unwrap();

        let reopened = JsonFileStore::<f64>::open(&path).unwrap();
        assert_eq!(reopened.get("out@/sample/A"), Some(12.25));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn json_store_flushes_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("createtimes.json");

        {
            let mut store = JsonFileStore::<f64>::open(&path).unwrap();
            store.set("k", 3.0).unwrap();
        }

        let reopened = JsonFileStore::<f64>::open(&path).unwrap();
        assert!(reopened.contains("k"));
    }

    #[test]
    fn json_store_keys_are_sorted_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");

        let mut store = JsonFileStore::<f64>::open(&path).unwrap();
        store.set("b", 2.0).unwrap();
        store.set("a", 1.0).unwrap();
        store.close().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }

    #[test]
    fn json_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::<f64>::open(&path).unwrap_err();
        assert!(matches!(err, PipedbError::Decode { .. }));
    }
}
