//! The task list controller: an ordered list of task rows that is the single
//! source of truth for rendering and persistence.
//!
//! Every committed mutation is flushed to the injected [`TaskPersistence`]
//! before the method returns, so the stored snapshot always has the same
//! records in the same order as the list.

use crate::{
    form::TaskInput,
    persistence::TaskPersistence,
    task::{Priority, Task},
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error("task description must not be empty")]
    MissingDescription,

    #[error("task due date must not be empty")]
    MissingDueDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMode {
    Viewing,
    Editing(TaskInput),
}

/// One displayed task plus its view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    task: Task,
    mode: RowMode,
}

impl TaskRow {
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn mode(&self) -> &RowMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, RowMode::Editing(_))
    }

    pub fn draft(&self) -> Option<&TaskInput> {
        match &self.mode {
            RowMode::Editing(draft) => Some(draft),
            RowMode::Viewing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Committed,
    Cancelled,
}

pub struct TaskList<P> {
    rows: Vec<TaskRow>,
    persistence: P,
}

impl<P: TaskPersistence> TaskList<P> {
    pub fn new(persistence: P) -> Self {
        Self {
            rows: Vec::new(),
            persistence,
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&TaskRow> {
        self.rows.get(index)
    }

    /// Committed task values in list order.
    pub fn tasks(&self) -> Vec<Task> {
        self.rows.iter().map(|row| row.task.clone()).collect()
    }

    pub fn count_label(&self) -> String {
        format!("Total Tasks: {}", self.rows.len())
    }

    /// Replays the stored snapshot in stored order, with the same presence
    /// checks as [`TaskList::create`], and returns how many tasks were
    /// restored. Rejected records are dropped from storage too.
    pub fn load_all(&mut self) -> usize {
        let stored = self.persistence.load();
        let total = stored.len();
        let mut restored = 0;
        for task in stored {
            match self.append(task) {
                Ok(_) => restored += 1,
                Err(err) => warn!(error = %err, "skipping stored task"),
            }
        }
        if restored != total {
            self.save_all();
        }
        info!(restored, "loaded tasks");
        restored
    }

    /// Writes the whole list to persistence. A failure is logged and leaves
    /// the list untouched.
    pub fn save_all(&mut self) -> bool {
        let snapshot = self.tasks();
        match self.persistence.save(&snapshot) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to save tasks");
                false
            }
        }
    }

    /// Appends a new task at the end of the list and persists the list.
    /// Returns the new row's index.
    pub fn create(
        &mut self,
        description: impl Into<String>,
        priority: Priority,
        due_date: impl Into<String>,
    ) -> Result<usize, CreateError> {
        let index = self
            .append(Task::new(description, priority, due_date))
            .inspect_err(|err| error!(error = %err, "task not created"))?;
        info!(index, priority = %priority, "created task");
        self.save_all();
        Ok(index)
    }

    fn append(&mut self, task: Task) -> Result<usize, CreateError> {
        if task.description.is_empty() {
            return Err(CreateError::MissingDescription);
        }
        if task.due_date.is_empty() {
            return Err(CreateError::MissingDueDate);
        }
        self.rows.push(TaskRow {
            task,
            mode: RowMode::Viewing,
        });
        Ok(self.rows.len() - 1)
    }

    /// Puts a row in edit mode with a draft of its current values. Returns
    /// false if there is no such row or it is already being edited.
    pub fn begin_edit(&mut self, index: usize) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if !row.is_editing() => {
                row.mode = RowMode::Editing(TaskInput::from_task(&row.task));
                true
            }
            _ => false,
        }
    }

    pub fn draft_mut(&mut self, index: usize) -> Option<&mut TaskInput> {
        match &mut self.rows.get_mut(index)?.mode {
            RowMode::Editing(draft) => Some(draft),
            RowMode::Viewing => None,
        }
    }

    /// Leaves edit mode, writing the draft into the task. A draft with an
    /// empty description or due date counts as a cancel. Only a commit is
    /// persisted. Returns `None` if the row is not being edited.
    pub fn commit_edit(&mut self, index: usize) -> Option<EditOutcome> {
        let row = self.rows.get_mut(index)?;
        let RowMode::Editing(draft) = std::mem::replace(&mut row.mode, RowMode::Viewing) else {
            return None;
        };
        if !draft.is_complete() {
            info!(index, "edit discarded");
            return Some(EditOutcome::Cancelled);
        }
        row.task = draft.to_task();
        info!(index, "edited task");
        self.save_all();
        Some(EditOutcome::Committed)
    }

    pub fn cancel_edit(&mut self, index: usize) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if row.is_editing() => {
                row.mode = RowMode::Viewing;
                true
            }
            _ => false,
        }
    }

    /// Removes a row and persists the remaining list.
    pub fn delete(&mut self, index: usize) -> Option<Task> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        info!(index, remaining = self.rows.len(), "deleted task");
        self.save_all();
        Some(row.task)
    }

    /// Orders rows by priority rank, high first. Ties keep their relative
    /// order, and rows keep their edit state.
    pub fn sort_by_priority(&mut self) {
        self.rows.sort_by_key(|row| row.task.priority.rank());
        info!(count = self.rows.len(), "sorted tasks by priority");
        self.save_all();
    }
}
