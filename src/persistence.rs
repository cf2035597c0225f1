//! Snapshot persistence for the task list.

use crate::{
    storage::{KeyValueStore, StorageError},
    task::Task,
};
use thiserror::Error;
use tracing::{debug, warn};

/// The storage slot holding the JSON snapshot.
pub const STORAGE_KEY: &str = "tasks";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode task snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Loads and saves the full ordered task snapshot.
pub trait TaskPersistence {
    /// Returns the stored snapshot, or an empty list when there is none or it
    /// cannot be read.
    fn load(&mut self) -> Vec<Task>;

    /// Overwrites the stored snapshot with `tasks`.
    fn save(&mut self, tasks: &[Task]) -> Result<(), PersistError>;

    /// False when changes are not written anywhere.
    fn is_attached(&self) -> bool {
        true
    }
}

impl<T: TaskPersistence + ?Sized> TaskPersistence for Box<T> {
    fn load(&mut self) -> Vec<Task> {
        (**self).load()
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), PersistError> {
        (**self).save(tasks)
    }

    fn is_attached(&self) -> bool {
        (**self).is_attached()
    }
}

/// Persists the snapshot as a JSON array under one key of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct StoragePersistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> StoragePersistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn discard_corrupt(&mut self, error: &serde_json::Error) {
        warn!(key = %self.key, %error, "discarding corrupt task snapshot");
        if let Err(err) = self.store.remove(&self.key) {
            warn!(key = %self.key, error = %err, "failed to clear corrupt task snapshot");
        }
    }
}

impl<S: KeyValueStore> TaskPersistence for StoragePersistence<S> {
    fn load(&mut self) -> Vec<Task> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read task snapshot");
                return Vec::new();
            }
        };
        // A stored `null` reads as an empty list.
        match serde_json::from_str::<Option<Vec<Task>>>(&raw) {
            Ok(tasks) => tasks.unwrap_or_default(),
            Err(err) => {
                self.discard_corrupt(&err);
                Vec::new()
            }
        }
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), PersistError> {
        let raw = serde_json::to_string(tasks)?;
        self.store.set(&self.key, &raw)?;
        debug!(key = %self.key, count = tasks.len(), "saved task snapshot");
        Ok(())
    }
}

/// Used when no storage is available: nothing is loaded, saves do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedPersistence;

impl TaskPersistence for DetachedPersistence {
    fn load(&mut self) -> Vec<Task> {
        Vec::new()
    }

    fn save(&mut self, _tasks: &[Task]) -> Result<(), PersistError> {
        Ok(())
    }

    fn is_attached(&self) -> bool {
        false
    }
}

/// Probes `store` once and returns a persistence backed by it, or a detached
/// one if the store does not accept writes.
pub fn attach<S>(mut store: S) -> Box<dyn TaskPersistence>
where
    S: KeyValueStore + 'static,
{
    match store.probe() {
        Ok(()) => Box::new(StoragePersistence::new(store)),
        Err(err) => {
            warn!(error = %err, "storage unavailable, continuing without persistence");
            Box::new(DetachedPersistence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStore, task::Priority};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    #[rstest]
    fn missing_key_loads_empty(store: MemoryStore) {
        assert!(StoragePersistence::new(store).load().is_empty());
    }

    #[rstest]
    fn save_writes_ordered_json_array(store: MemoryStore) {
        let mut persistence = StoragePersistence::new(store.clone());
        let tasks = vec![
            Task::new("b", Priority::Low, "2024-02-02"),
            Task::new("a", Priority::High, "2024-01-01"),
        ];
        persistence.save(&tasks).unwrap();

        assert_eq!(
            store.raw(STORAGE_KEY).as_deref(),
            Some(
                r#"[{"description":"b","priority":"low","dueDate":"2024-02-02"},{"description":"a","priority":"high","dueDate":"2024-01-01"}]"#
            )
        );
        assert_eq!(persistence.load(), tasks);
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"description":"a"}"#)]
    #[case(r#"[{"description":"a","priority":"urgent","dueDate":"2024-01-01"}]"#)]
    fn corrupt_snapshot_is_discarded_and_cleared(store: MemoryStore, #[case] raw: &str) {
        store.seed(STORAGE_KEY, raw);
        let mut persistence = StoragePersistence::new(store.clone());

        assert!(persistence.load().is_empty());
        assert_eq!(store.raw(STORAGE_KEY), None);
    }

    #[rstest]
    fn null_snapshot_loads_empty_and_is_kept(store: MemoryStore) {
        store.seed(STORAGE_KEY, "null");
        let mut persistence = StoragePersistence::new(store.clone());

        assert!(persistence.load().is_empty());
        assert_eq!(store.raw(STORAGE_KEY).as_deref(), Some("null"));
    }

    #[rstest]
    fn read_failure_loads_empty(store: MemoryStore) {
        store.seed(STORAGE_KEY, "[]");
        store.set_unavailable(true);
        assert!(StoragePersistence::new(store).load().is_empty());
    }

    #[test]
    fn attach_falls_back_to_detached_when_probe_fails() {
        let mut persistence = attach(MemoryStore::unavailable());
        assert!(!persistence.is_attached());
        assert!(persistence
            .save(&[Task::new("a", Priority::Low, "2024-01-01")])
            .is_ok());
    }

    #[rstest]
    fn attach_uses_working_store(store: MemoryStore) {
        let mut persistence = attach(store.clone());
        assert!(persistence.is_attached());
        persistence.save(&[]).unwrap();
        assert_eq!(store.raw(STORAGE_KEY).as_deref(), Some("[]"));
    }
}
