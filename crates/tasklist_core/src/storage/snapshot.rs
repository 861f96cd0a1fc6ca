//! JSON encoding of the whole task list state.
//!
//! `visibleTasks` is written alongside `tasks` but never read back; the
//! visible list is always recomputed from `tasks` and `showCompleted`.

use crate::error::AppError;
use crate::model::Task;
use crate::state::TaskListState;
use crate::storage::KeyValueStore;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const STATE_KEY: &str = "taskState";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotOut<'a> {
    show_completed: bool,
    visible_tasks: &'a [Task],
    tasks: &'a [Task],
    next_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotIn {
    show_completed: bool,
    tasks: Vec<Task>,
    #[serde(default)]
    next_id: Option<u64>,
}

pub fn encode(state: &TaskListState) -> Result<String, AppError> {
    let snapshot = SnapshotOut {
        show_completed: state.show_completed(),
        visible_tasks: state.visible_tasks(),
        tasks: state.tasks(),
        next_id: state.next_id(),
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Parses a stored blob. Parse success is the only check; records are
/// trusted as stored.
pub fn decode(content: &str) -> Result<TaskListState, AppError> {
    let snapshot: SnapshotIn = serde_json::from_str(content)?;
    Ok(TaskListState::from_parts(
        snapshot.tasks,
        snapshot.show_completed,
        snapshot.next_id,
    ))
}

/// Reads the state under `key`, falling back to the empty default when the
/// key is missing, unreadable, or does not decode.
pub fn load_or_default(store: &dyn KeyValueStore, key: &str) -> TaskListState {
    let content = match store.get(key) {
        Ok(Some(content)) => content,
        Ok(None) => {
            debug!("event=state_load module=storage status=empty key={key}");
            return TaskListState::default();
        }
        Err(err) => {
            warn!("event=state_load module=storage status=read_failed key={key} error={err}");
            return TaskListState::default();
        }
    };

    match decode(&content) {
        Ok(state) => {
            debug!(
                "event=state_load module=storage status=ok key={} tasks={}",
                key,
                state.tasks().len()
            );
            state
        }
        Err(err) => {
            warn!("event=state_load module=storage status=decode_failed key={key} error={err}");
            TaskListState::default()
        }
    }
}
