//! Pure transitions over the task list.
//!
//! Every operation takes the current state by reference and returns a new
//! one; nothing here touches storage or the clock. `visible_tasks` is
//! recomputed at the end of every transition so it always matches
//! `tasks` filtered by `show_completed`.

use crate::error::AppError;
use crate::model::{Task, TaskDraft, TaskId};
use time::OffsetDateTime;

pub const DESCRIPTION_REQUIRED: &str = "description required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListState {
    tasks: Vec<Task>,
    show_completed: bool,
    visible_tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskListState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            show_completed: true,
            visible_tasks: Vec::new(),
            next_id: 1,
        }
    }
}

impl TaskListState {
    /// Builds a state from persisted parts.
    ///
    /// `next_id` is raised past the largest id in `tasks` when it is missing
    /// or stale, so newly added tasks never collide with loaded ones.
    pub fn from_parts(tasks: Vec<Task>, show_completed: bool, next_id: Option<u64>) -> Self {
        let floor = tasks
            .iter()
            .map(|task| task.id.0.saturating_add(1))
            .max()
            .unwrap_or(1);
        let next_id = next_id.unwrap_or(floor).max(floor);

        Self {
            tasks,
            show_completed,
            visible_tasks: Vec::new(),
            next_id,
        }
        .recomputed()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn visible_tasks(&self) -> &[Task] {
        &self.visible_tasks
    }

    pub fn show_completed(&self) -> bool {
        self.show_completed
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn toggle_filter(&self) -> Self {
        Self {
            show_completed: !self.show_completed,
            ..self.clone()
        }
        .recomputed()
    }

    /// Flips completion for every task matching `id`. Unknown ids leave the
    /// task list untouched.
    pub fn toggle_task(&self, id: TaskId, now: OffsetDateTime) -> Self {
        let tasks = self
            .tasks
            .iter()
            .map(|task| {
                if task.id != id {
                    return task.clone();
                }
                Task {
                    completed_at: match task.completed_at {
                        Some(_) => None,
                        None => Some(now),
                    },
                    ..task.clone()
                }
            })
            .collect();

        Self {
            tasks,
            ..self.clone()
        }
        .recomputed()
    }

    /// Appends a pending task built from `draft`.
    ///
    /// # Errors
    /// - `InvalidInput` when the description is missing or blank.
    /// - `InvalidData` when no id is left to hand out.
    ///
    /// The state is not changed on error.
    pub fn add_task(&self, draft: &TaskDraft) -> Result<(Self, Task), AppError> {
        let description = validate_description(draft.description.as_deref())?;
        // `u64::MAX` is never issued, so a stored task holding it marks the
        // id space as used up.
        let following = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| AppError::invalid_data("task id space exhausted"))?;
        let task = Task {
            id: TaskId(self.next_id),
            description: description.to_string(),
            estimated_at: draft.estimated_at,
            completed_at: None,
        };

        let mut tasks = self.tasks.clone();
        tasks.push(task.clone());

        let next = Self {
            tasks,
            next_id: following,
            ..self.clone()
        }
        .recomputed();

        Ok((next, task))
    }

    /// Removes the task matching `id`, keeping the rest in order.
    pub fn delete_task(&self, id: TaskId) -> (Self, Option<Task>) {
        let mut removed = None;
        let tasks = self
            .tasks
            .iter()
            .filter(|task| {
                if task.id == id {
                    removed = Some((*task).clone());
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        let next = Self {
            tasks,
            ..self.clone()
        }
        .recomputed();

        (next, removed)
    }

    fn recomputed(mut self) -> Self {
        self.visible_tasks = visible_tasks(&self.tasks, self.show_completed);
        self
    }
}

/// All tasks when `show_completed` is set, otherwise only pending ones, in
/// their original order.
pub fn visible_tasks(tasks: &[Task], show_completed: bool) -> Vec<Task> {
    if show_completed {
        return tasks.to_vec();
    }

    tasks.iter().filter(|task| !task.is_done()).cloned().collect()
}

pub fn validate_description(description: Option<&str>) -> Result<&str, AppError> {
    match description.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(AppError::invalid_input(DESCRIPTION_REQUIRED)),
    }
}
