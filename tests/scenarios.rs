//! End-to-end scenarios driven through the public controller and app API.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::{
    io,
    sync::{Arc, Mutex},
};
use taskers::{
    app::App,
    persistence::{self, StoragePersistence, STORAGE_KEY},
    storage::{FileStore, KeyValueStore, MemoryStore},
    task::{Priority, Task},
    task_list::TaskList,
};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn press(app: &mut App<StoragePersistence<MemoryStore>>, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

#[test]
fn submit_with_empty_description_shows_alert_and_adds_nothing() {
    let store = MemoryStore::new();
    let mut app = App::new(TaskList::new(StoragePersistence::new(store.clone())));
    app.form.input.priority = Priority::High;
    app.form.input.due_date = "2024-05-01".to_string();

    press(&mut app, KeyCode::Enter);

    assert_eq!(
        app.alert.as_deref(),
        Some("Please enter both a task description and a due date.")
    );
    assert_eq!(app.list.count_label(), "Total Tasks: 0");
    assert_eq!(store.raw(STORAGE_KEY), None);
}

#[test]
fn sorting_low_high_medium_yields_high_medium_low() {
    let store = MemoryStore::new();
    let mut list = TaskList::new(StoragePersistence::new(store.clone()));
    list.create("a", Priority::Low, "2024-01-01").unwrap();
    list.create("b", Priority::High, "2024-01-02").unwrap();
    list.create("c", Priority::Medium, "2024-01-03").unwrap();

    list.sort_by_priority();

    let priorities: Vec<Priority> = list.tasks().iter().map(|t| t.priority).collect();
    assert_eq!(priorities, [Priority::High, Priority::Medium, Priority::Low]);

    let mut reloaded = TaskList::new(StoragePersistence::new(store));
    reloaded.load_all();
    assert_eq!(reloaded.tasks(), list.tasks());
}

#[test]
fn corrupt_snapshot_reloads_empty_and_is_removed() {
    let store = MemoryStore::new();
    store.seed(STORAGE_KEY, "definitely {not json");
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();

    let restored = tracing::subscriber::with_default(subscriber, || {
        let mut app = App::new(TaskList::new(StoragePersistence::new(store.clone())));
        app.load()
    });

    assert_eq!(restored, 0);
    assert_eq!(store.raw(STORAGE_KEY), None);
    let logs = logs.contents();
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("discarding corrupt task snapshot"), "logs: {logs}");
}

#[test]
fn unavailable_storage_still_allows_in_session_use() {
    let mut list = TaskList::new(persistence::attach(MemoryStore::unavailable()));
    assert_eq!(list.load_all(), 0);

    list.create("offline", Priority::Medium, "2024-07-07").unwrap();
    list.sort_by_priority();
    assert_eq!(list.delete(0).map(|t| t.description), Some("offline".to_string()));
    assert!(list.is_empty());
    assert!(!list.persistence().is_attached());
}

#[test]
fn file_backed_list_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let mut list = TaskList::new(persistence::attach(FileStore::new(&path)));
        list.create("Write report", Priority::High, "2024-05-01").unwrap();
        list.create("Water plants", Priority::Low, "2024-05-02").unwrap();
        list.create("File taxes", Priority::Medium, "2024-04-15").unwrap();
        list.delete(1);
        list.begin_edit(1);
        list.draft_mut(1).unwrap().due_date = "2024-04-30".to_string();
        list.commit_edit(1);
    }

    let mut list = TaskList::new(persistence::attach(FileStore::new(&path)));
    assert_eq!(list.load_all(), 2);
    assert_eq!(
        list.tasks(),
        vec![
            Task::new("Write report", Priority::High, "2024-05-01"),
            Task::new("File taxes", Priority::Medium, "2024-04-30"),
        ]
    );
    assert_eq!(list.count_label(), "Total Tasks: 2");
}

#[test]
fn other_keys_in_the_store_are_left_alone() {
    let mut store = MemoryStore::new();
    store.set("theme", "dark").unwrap();
    let mut list = TaskList::new(StoragePersistence::new(store.clone()));
    list.create("x", Priority::Low, "2024-01-01").unwrap();
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
}
