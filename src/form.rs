use crate::task::{Priority, Task};
use chrono::{Days, NaiveDate};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter both a task description and a due date.")]
    MissingFields,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Description,
    Priority,
    DueDate,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Description => FormField::Priority,
            FormField::Priority => FormField::DueDate,
            FormField::DueDate => FormField::Description,
        }
    }

    pub fn is_text(self) -> bool {
        !matches!(self, FormField::Priority)
    }
}

/// Moves a `yyyy-mm-dd` date field by `days`. An empty or unreadable field
/// starts from `today`.
pub fn step_date(current: &str, days: i64, today: NaiveDate) -> String {
    let base = NaiveDate::parse_from_str(current, DATE_FORMAT).unwrap_or(today);
    let delta = Days::new(days.unsigned_abs());
    let stepped = if days >= 0 {
        base.checked_add_days(delta)
    } else {
        base.checked_sub_days(delta)
    };
    stepped.unwrap_or(base).format(DATE_FORMAT).to_string()
}

/// Values of the three task inputs plus which one has focus. Backs both the
/// create form and a row in edit mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub focus: FormField,
}

impl TaskInput {
    pub fn from_task(task: &Task) -> Self {
        Self {
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date.clone(),
            focus: FormField::Description,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn insert_char(&mut self, c: char) {
        match self.focus {
            FormField::Description => self.description.push(c),
            FormField::DueDate => self.due_date.push(c),
            FormField::Priority => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Description => {
                self.description.pop();
            }
            FormField::DueDate => {
                self.due_date.pop();
            }
            FormField::Priority => {}
        }
    }

    pub fn cycle_priority(&mut self, forward: bool) {
        self.priority = if forward {
            self.priority.next()
        } else {
            self.priority.prev()
        };
    }

    pub fn step_due_date(&mut self, days: i64, today: NaiveDate) {
        self.due_date = step_date(&self.due_date, days, today);
    }

    /// Presence check only: both text inputs must be non-empty.
    pub fn is_complete(&self) -> bool {
        !self.description.is_empty() && !self.due_date.is_empty()
    }

    pub fn to_task(&self) -> Task {
        Task::new(self.description.clone(), self.priority, self.due_date.clone())
    }
}

/// The create form shown above the list.
#[derive(Debug, Default, Clone)]
pub struct CreateForm {
    pub input: TaskInput,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands back the new task if description and due date are present. On
    /// success the text inputs are cleared; the priority selection stays.
    pub fn submit(&mut self) -> Result<Task, FormError> {
        if !self.input.is_complete() {
            return Err(FormError::MissingFields);
        }
        let task = self.input.to_task();
        self.input.description.clear();
        self.input.due_date.clear();
        self.input.focus = FormField::Description;
        Ok(task)
    }
}
