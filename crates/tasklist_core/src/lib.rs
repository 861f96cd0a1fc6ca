pub mod config;
pub mod error;
pub mod item;
pub mod model;
pub mod state;
pub mod storage;
pub mod store;

pub use error::AppError;
pub use model::{Task, TaskDraft, TaskId};
pub use store::TaskStore;
