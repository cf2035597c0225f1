//! Key-value storage backends for the persisted task snapshot.
//!
//! The storage is an opaque string-to-string map with no transactions,
//! mirroring a browser's local storage. [`FileStore`] keeps the map in a JSON
//! file; [`MemoryStore`] keeps it in memory and can pretend to be unavailable.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};
use thiserror::Error;

const PROBE_KEY: &str = "__taskers_probe__";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("storage i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storage file {path} is not a key-value map: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the whole value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Checks that the store accepts writes by setting and removing a scratch key.
    fn probe(&mut self) -> Result<(), StorageError> {
        self.set(PROBE_KEY, PROBE_KEY)?;
        self.remove(PROBE_KEY)
    }
}

/// A key-value map persisted as one JSON object file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the map for a write; a corrupt file is replaced rather than kept.
    fn read_map_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_map() {
            Err(StorageError::Corrupt { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "replacing unreadable storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        let data = serde_json::to_string_pretty(map).map_err(|err| io_err(err.into()))?;
        // Write beside the target and rename, so readers never see half a file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map_for_write()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    unavailable: bool,
}

/// In-memory store. Clones share the same entries, so a test can keep a
/// handle and inspect what the controller wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every operation.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unavailable(true);
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }

    /// Writes a raw value, bypassing availability.
    pub fn seed(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.borrow().entries.get(key).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.state.borrow().unavailable {
            return Err(StorageError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.seed(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.state.borrow_mut().entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn file_store_starts_empty(dir: TempDir) {
        let store = FileStore::new(dir.path().join("store.json"));
        assert_eq!(store.get("tasks").unwrap(), None);
    }

    #[rstest]
    fn file_store_set_overwrites_and_remove_clears(dir: TempDir) {
        let path = dir.path().join("store.json");
        let mut store = FileStore::new(&path);
        store.set("tasks", "[1]").unwrap();
        store.set("other", "x").unwrap();
        store.set("tasks", "[2]").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("tasks").unwrap().as_deref(), Some("[2]"));

        store.remove("tasks").unwrap();
        assert_eq!(reopened.get("tasks").unwrap(), None);
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[rstest]
    fn file_store_reports_corrupt_file_on_read(dir: TempDir) {
        let path = dir.path().join("store.json");
        fs::write(&path, "not a map").unwrap();
        let mut store = FileStore::new(&path);

        assert!(matches!(store.get("tasks"), Err(StorageError::Corrupt { .. })));

        store.set("tasks", "[]").unwrap();
        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("[]"));
    }

    #[rstest]
    fn file_store_probe_fails_without_parent_directory(dir: TempDir) {
        let mut store = FileStore::new(dir.path().join("missing").join("store.json"));
        assert!(matches!(store.probe(), Err(StorageError::Io { .. })));
    }

    #[rstest]
    fn file_store_probe_leaves_no_key_behind(dir: TempDir) {
        let mut store = FileStore::new(dir.path().join("store.json"));
        store.probe().unwrap();
        assert_eq!(store.get(PROBE_KEY).unwrap(), None);
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        handle.set("tasks", "[]").unwrap();
        assert_eq!(store.raw("tasks").as_deref(), Some("[]"));
    }

    #[test]
    fn unavailable_memory_store_refuses_everything() {
        let mut store = MemoryStore::unavailable();
        assert!(store.probe().is_err());
        assert!(store.get("tasks").is_err());
        assert!(store.remove("tasks").is_err());
    }
}
