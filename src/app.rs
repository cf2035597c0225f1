//! Keyboard-driven application state around the task list controller.

use crate::{
    form::{CreateForm, FormField, TaskInput},
    persistence::TaskPersistence,
    task_list::TaskList,
};
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Form,
    List,
}

pub struct App<P> {
    pub list: TaskList<P>,
    pub form: CreateForm,
    pub focus: Focus,
    pub selected: usize,
    /// Blocking message; swallows all keys until dismissed.
    pub alert: Option<String>,
    pub status: String,
    pub should_quit: bool,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<P: TaskPersistence> App<P> {
    pub fn new(list: TaskList<P>) -> Self {
        let status = if list.persistence().is_attached() {
            "changes are saved".to_string()
        } else {
            "storage unavailable, changes are not saved".to_string()
        };
        Self {
            list,
            form: CreateForm::new(),
            focus: Focus::Form,
            selected: 0,
            alert: None,
            status,
            should_quit: false,
            today: local_today,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Replaces the clock used by the date pickers.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn load(&mut self) -> usize {
        let restored = self.list.load_all();
        if restored > 0 {
            self.focus = Focus::List;
        }
        restored
    }

    /// Index of the row currently in edit mode, if any.
    pub fn editing_row(&self) -> Option<usize> {
        self.list.rows().iter().position(|row| row.is_editing())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('s') if self.alert.is_none() => self.sort(),
                _ => {}
            }
            return;
        }
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alert = None;
            }
            return;
        }
        match self.focus {
            Focus::Form => self.handle_form_key(key),
            Focus::List => match self.editing_row() {
                Some(index) => self.handle_draft_key(index, key),
                None => self.handle_list_key(key),
            },
        }
    }

    /// Validates the create form and appends a task, or raises the alert.
    pub fn submit_form(&mut self) {
        match self.form.submit() {
            Ok(task) => {
                if let Ok(index) = self.list.create(task.description, task.priority, task.due_date)
                {
                    self.selected = index;
                }
            }
            Err(err) => {
                debug!(error = %err, "rejected form submission");
                self.alert = Some(err.to_string());
            }
        }
    }

    pub fn sort(&mut self) {
        self.list.sort_by_priority();
        if let Some(index) = self.editing_row() {
            self.selected = index;
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab if self.form.input.focus == FormField::DueDate => {
                self.form.input.focus = FormField::Description;
                self.focus = Focus::List;
            }
            KeyCode::BackTab | KeyCode::Esc => self.focus = Focus::List,
            code => edit_input(&mut self.form.input, code, (self.today)()),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('a') => self.focus = Focus::Form,
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.list.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                self.list.begin_edit(self.selected);
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                if self.list.delete(self.selected).is_some() {
                    self.selected = self.selected.min(self.list.len().saturating_sub(1));
                }
            }
            KeyCode::Char('s') => self.sort(),
            _ => {}
        }
    }

    fn handle_draft_key(&mut self, index: usize, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.list.commit_edit(index);
            }
            KeyCode::Esc => {
                self.list.cancel_edit(index);
            }
            code => {
                let today = (self.today)();
                if let Some(draft) = self.list.draft_mut(index) {
                    edit_input(draft, code, today);
                }
            }
        }
    }
}

/// Key handling shared by the create form and a row in edit mode.
fn edit_input(input: &mut TaskInput, code: KeyCode, today: NaiveDate) {
    match (code, input.focus) {
        (KeyCode::Tab, _) => input.focus_next(),
        (KeyCode::Left, FormField::Priority) => input.cycle_priority(false),
        (KeyCode::Right | KeyCode::Char(' '), FormField::Priority) => input.cycle_priority(true),
        (KeyCode::Up, FormField::DueDate) => input.step_due_date(1, today),
        (KeyCode::Down, FormField::DueDate) => input.step_due_date(-1, today),
        (KeyCode::Backspace, _) => input.backspace(),
        (KeyCode::Char(c), field) if field.is_text() => input.insert_char(c),
        _ => {}
    }
}
