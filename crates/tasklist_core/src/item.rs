//! Row-level view of a single task and the gestures it reports upward.
//!
//! A `TaskItem` keeps nothing of its own: done/pending and the date it shows
//! are read off the borrowed `Task` every time.

use crate::error::AppError;
use crate::model::{Task, TaskDraft, TaskId};
use time::OffsetDateTime;
use time::macros::format_description;

/// User gestures a row can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Tap on the row's check area.
    Tap,
    /// Press on the delete button revealed by a trailing swipe.
    TrailingDelete,
    /// Leading swipe opened all the way.
    FullSwipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEvent {
    Toggle(TaskId),
    Delete(TaskId),
}

/// Receives row events. Implemented by the task store.
pub trait TaskItemHandler {
    fn on_toggle_task(&mut self, id: TaskId);

    fn on_delete(&mut self, id: TaskId);
}

/// Receives the add-task form's save and cancel actions.
pub trait AddTaskHandler {
    fn on_save(&mut self, draft: TaskDraft) -> Result<Task, AppError>;

    fn on_cancel(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct TaskItem<'a> {
    task: &'a Task,
}

impl<'a> TaskItem<'a> {
    pub fn new(task: &'a Task) -> Self {
        Self { task }
    }

    pub fn id(&self) -> TaskId {
        self.task.id
    }

    pub fn description(&self) -> &'a str {
        &self.task.description
    }

    pub fn is_done(&self) -> bool {
        self.task.completed_at.is_some()
    }

    /// Completion time for done tasks, estimated time otherwise.
    pub fn display_date(&self) -> OffsetDateTime {
        self.task.completed_at.unwrap_or(self.task.estimated_at)
    }

    pub fn format_date(&self) -> Result<String, AppError> {
        self.display_date()
            .format(format_description!(
                "[weekday repr:short], [day padding:none] [month repr:long]"
            ))
            .map_err(|err| AppError::invalid_data(err.to_string()))
    }

    pub fn event(&self, gesture: Gesture) -> ItemEvent {
        match gesture {
            Gesture::Tap => ItemEvent::Toggle(self.task.id),
            Gesture::TrailingDelete | Gesture::FullSwipe => ItemEvent::Delete(self.task.id),
        }
    }

    pub fn dispatch<H: TaskItemHandler + ?Sized>(&self, gesture: Gesture, handler: &mut H) {
        match self.event(gesture) {
            ItemEvent::Toggle(id) => handler.on_toggle_task(id),
            ItemEvent::Delete(id) => handler.on_delete(id),
        }
    }
}

pub fn items(tasks: &[Task]) -> impl Iterator<Item = TaskItem<'_>> {
    tasks.iter().map(TaskItem::new)
}
