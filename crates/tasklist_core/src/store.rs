//! The task store: owner of the task list state.
//!
//! # Responsibility
//! - Load the persisted state once at startup, falling back to an empty list.
//! - Apply every mutation as a pure state transition, then persist the
//!   result through the write queue.
//!
//! # Invariants
//! - `visible_tasks()` always reflects `tasks()` under the current filter.
//! - Persistence failures never reach callers; only validation errors do.

use crate::error::AppError;
use crate::item::{AddTaskHandler, TaskItemHandler};
use crate::model::{Task, TaskDraft, TaskId};
use crate::state::TaskListState;
use crate::storage::snapshot::{self, STATE_KEY};
use crate::storage::{KeyValueStore, WriteQueue};
use log::{debug, info, warn};
use time::OffsetDateTime;

pub struct TaskStore {
    state: TaskListState,
    key: String,
    writer: WriteQueue,
    add_task_open: bool,
}

impl TaskStore {
    /// Loads the state saved under the default key and takes ownership of
    /// `storage` for all later writes.
    pub fn open<S: KeyValueStore>(storage: S) -> Result<Self, AppError> {
        Self::open_with_key(storage, STATE_KEY)
    }

    pub fn open_with_key<S: KeyValueStore>(storage: S, key: &str) -> Result<Self, AppError> {
        let state = snapshot::load_or_default(&storage, key);
        let writer = WriteQueue::spawn(storage)?;

        info!(
            "event=store_open module=store status=ok key={} tasks={} show_completed={}",
            key,
            state.tasks().len(),
            state.show_completed()
        );

        Ok(Self {
            state,
            key: key.to_string(),
            writer,
            add_task_open: false,
        })
    }

    pub fn state(&self) -> &TaskListState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    pub fn visible_tasks(&self) -> &[Task] {
        self.state.visible_tasks()
    }

    pub fn show_completed(&self) -> bool {
        self.state.show_completed()
    }

    pub fn is_add_task_open(&self) -> bool {
        self.add_task_open
    }

    pub fn open_add_task(&mut self) {
        self.add_task_open = true;
    }

    pub fn cancel_add_task(&mut self) {
        self.add_task_open = false;
    }

    pub fn toggle_filter(&mut self) {
        let next = self.state.toggle_filter();
        debug!(
            "event=toggle_filter module=store show_completed={}",
            next.show_completed()
        );
        self.commit(next);
    }

    pub fn toggle_task(&mut self, id: TaskId) {
        self.toggle_task_at(id, OffsetDateTime::now_utc());
    }

    pub fn toggle_task_at(&mut self, id: TaskId, now: OffsetDateTime) {
        if self.state.find(id).is_none() {
            debug!("event=toggle_task module=store status=not_found id={id}");
        }
        let next = self.state.toggle_task(id, now);
        self.commit(next);
    }

    /// Appends a task built from `draft` and closes the add form.
    ///
    /// # Errors
    /// - `InvalidInput("description required")` when the description is
    ///   missing or blank. Nothing is changed or persisted in that case.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let (next, task) = match self.state.add_task(&draft) {
            Ok(result) => result,
            Err(err) => {
                debug!("event=add_task module=store status=rejected error={err}");
                return Err(err);
            }
        };

        debug!("event=add_task module=store status=ok id={}", task.id);
        self.add_task_open = false;
        self.commit(next);
        Ok(task)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        let (next, removed) = self.state.delete_task(id);
        if removed.is_none() {
            debug!("event=delete_task module=store status=not_found id={id}");
        }
        self.commit(next);
        removed
    }

    /// Waits until every write issued so far has reached storage.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn commit(&mut self, next: TaskListState) {
        self.state = next;
        self.persist();
    }

    fn persist(&self) {
        match snapshot::encode(&self.state) {
            Ok(content) => self.writer.enqueue(&self.key, content),
            Err(err) => {
                warn!("event=state_save module=store status=encode_failed error={err}")
            }
        }
    }
}

impl TaskItemHandler for TaskStore {
    fn on_toggle_task(&mut self, id: TaskId) {
        self.toggle_task(id);
    }

    fn on_delete(&mut self, id: TaskId) {
        self.delete_task(id);
    }
}

impl AddTaskHandler for TaskStore {
    fn on_save(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        self.add_task(draft)
    }

    fn on_cancel(&mut self) {
        self.cancel_add_task();
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::error::AppError;
    use crate::item::{AddTaskHandler, Gesture, TaskItem};
    use crate::model::{Task, TaskDraft, TaskId};
    use crate::state::TaskListState;
    use crate::storage::snapshot::{self, STATE_KEY};
    use crate::storage::{KeyValueStore, MemoryStore};
    use time::OffsetDateTime;
    use time::macros::datetime;

    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::io("read-only storage"))
        }
    }

    fn seeded(tasks: Vec<Task>, show_completed: bool) -> MemoryStore {
        let state = TaskListState::from_parts(tasks, show_completed, None);
        MemoryStore::with_entry(STATE_KEY, snapshot::encode(&state).unwrap())
    }

    fn task(id: u64, done: bool) -> Task {
        Task {
            id: TaskId(id),
            description: format!("task {id}"),
            estimated_at: datetime!(2026-01-03 10:00 UTC),
            completed_at: done.then(|| datetime!(2026-01-03 12:00 UTC)),
        }
    }

    fn persisted(storage: &MemoryStore) -> TaskListState {
        snapshot::decode(&storage.get(STATE_KEY).unwrap().unwrap()).unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|task| task.id.0).collect()
    }

    #[test]
    fn open_without_saved_state_uses_default() {
        let store = TaskStore::open(MemoryStore::new()).unwrap();

        assert!(store.tasks().is_empty());
        assert!(store.show_completed());
        assert!(!store.is_add_task_open());
    }

    #[test]
    fn open_with_corrupt_state_uses_default() {
        let storage = MemoryStore::with_entry(STATE_KEY, "{\"tasks\": [");
        let store = TaskStore::open(storage).unwrap();

        assert_eq!(store.state(), &TaskListState::default());
    }

    #[test]
    fn open_recomputes_visible_tasks_from_saved_filter() {
        let storage = seeded(vec![task(1, true), task(2, false)], false);
        let store = TaskStore::open(storage).unwrap();

        assert_eq!(ids(store.tasks()), vec![1, 2]);
        assert_eq!(ids(store.visible_tasks()), vec![2]);
    }

    #[test]
    fn every_mutation_persists_full_state() {
        let storage = MemoryStore::new();
        let mut store = TaskStore::open(storage.clone()).unwrap();

        let added = store
            .add_task(TaskDraft::new("Buy milk", datetime!(2026-01-05 9:00 UTC)))
            .unwrap();
        store.flush();
        assert_eq!(persisted(&storage).tasks(), store.tasks());

        store.toggle_task(added.id);
        store.flush();
        assert!(persisted(&storage).tasks()[0].is_done());

        store.toggle_filter();
        store.flush();
        let saved = persisted(&storage);
        assert!(!saved.show_completed());
        assert!(saved.visible_tasks().is_empty());

        store.delete_task(added.id);
        store.flush();
        assert!(persisted(&storage).tasks().is_empty());
    }

    #[test]
    fn reopen_restores_saved_tasks() {
        let storage = MemoryStore::new();
        {
            let mut store = TaskStore::open(storage.clone()).unwrap();
            store
                .add_task(TaskDraft::new("first", datetime!(2026-01-05 9:00 UTC)))
                .unwrap();
            let second = store
                .add_task(TaskDraft::new("second", datetime!(2026-01-06 9:00 UTC)))
                .unwrap();
            store.toggle_task(second.id);
        }

        let reopened = TaskStore::open(storage).unwrap();
        assert_eq!(reopened.tasks().len(), 2);
        assert!(!reopened.tasks()[0].is_done());
        assert!(reopened.tasks()[1].is_done());
    }

    #[test]
    fn add_task_rejection_leaves_state_and_storage_untouched() {
        let storage = MemoryStore::new();
        let mut store = TaskStore::open(storage.clone()).unwrap();
        store.open_add_task();

        for description in [Some(""), Some("   "), None] {
            let draft = TaskDraft {
                description: description.map(str::to_string),
                estimated_at: datetime!(2026-01-05 9:00 UTC),
            };
            let err = store.add_task(draft).unwrap_err();
            assert_eq!(err, AppError::invalid_input("description required"));
        }
        store.flush();

        assert!(store.tasks().is_empty());
        assert!(store.is_add_task_open());
        assert_eq!(storage.get(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn add_task_closes_add_form() {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap();
        store.open_add_task();

        store
            .on_save(TaskDraft::new("Buy milk", datetime!(2026-01-05 9:00 UTC)))
            .unwrap();

        assert!(!store.is_add_task_open());
        assert_eq!(store.tasks()[0].description, "Buy milk");
        assert_eq!(store.tasks()[0].completed_at, None);
    }

    #[test]
    fn cancel_closes_add_form_without_changes() {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap();
        store.open_add_task();

        store.on_cancel();

        assert!(!store.is_add_task_open());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn toggle_task_sets_now_then_clears() {
        let mut store = TaskStore::open(seeded(vec![task(1, false)], true)).unwrap();
        let before = OffsetDateTime::now_utc();

        store.toggle_task(TaskId(1));
        let completed_at = store.tasks()[0].completed_at.unwrap();
        assert!(completed_at >= before);

        store.toggle_task(TaskId(1));
        assert_eq!(store.tasks()[0].completed_at, None);
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let mut store = TaskStore::open(seeded(vec![task(1, false)], true)).unwrap();
        let before = store.state().clone();

        store.toggle_task(TaskId(99));
        assert!(store.delete_task(TaskId(99)).is_none());

        assert_eq!(store.state(), &before);
    }

    #[test]
    fn delete_keeps_remaining_order() {
        let mut store =
            TaskStore::open(seeded(vec![task(1, false), task(2, false), task(3, true)], true))
                .unwrap();

        let removed = store.delete_task(TaskId(2));

        assert_eq!(removed.map(|task| task.id), Some(TaskId(2)));
        assert_eq!(ids(store.tasks()), vec![1, 3]);
    }

    #[test]
    fn item_gestures_drive_store() {
        let mut store = TaskStore::open(seeded(vec![task(1, false), task(2, false)], false)).unwrap();

        let first = store.visible_tasks()[0].clone();
        TaskItem::new(&first).dispatch(Gesture::Tap, &mut store);
        assert_eq!(ids(store.visible_tasks()), vec![2]);

        let second = store.visible_tasks()[0].clone();
        TaskItem::new(&second).dispatch(Gesture::FullSwipe, &mut store);
        assert!(store.visible_tasks().is_empty());
        assert_eq!(ids(store.tasks()), vec![1]);
    }

    #[test]
    fn write_failures_do_not_surface() {
        let storage = ReadOnlyStore {
            inner: seeded(vec![task(1, false)], true),
        };
        let mut store = TaskStore::open(storage).unwrap();

        store.toggle_task(TaskId(1));
        store.toggle_filter();
        let added = store.add_task(TaskDraft::new("still works", datetime!(2026-01-05 9:00 UTC)));
        store.flush();

        assert!(added.is_ok());
        assert_eq!(store.tasks().len(), 2);
        assert!(!store.show_completed());
    }
}
