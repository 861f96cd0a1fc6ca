//! Key-value persistence for the task list.
//!
//! The store is treated as an opaque get/set API over string values; the
//! whole task list is written as one JSON blob under a single key.

use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub mod json_store;
pub mod snapshot;
pub mod write_queue;

pub use json_store::JsonFileStore;
pub use write_queue::WriteQueue;

pub trait KeyValueStore: Send + 'static {
    /// Returns `Ok(None)` when nothing has been stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replaces whatever is stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::io("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::io("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
