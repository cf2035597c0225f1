//! A terminal task list: add, edit, delete and sort tasks, with the whole
//! list written to a key-value storage slot after every change.

pub mod app;
pub mod config;
pub mod form;
pub mod logging;
pub mod persistence;
pub mod storage;
pub mod task;
pub mod task_list;
pub mod ui;
