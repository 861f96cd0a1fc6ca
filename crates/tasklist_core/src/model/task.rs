use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub estimated_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Input handed over by the add-task form. The description is optional
/// because the form may submit without one; validation happens on add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub description: Option<String>,
    pub estimated_at: OffsetDateTime,
}

impl TaskDraft {
    pub fn new<D: Into<String>>(description: D, estimated_at: OffsetDateTime) -> Self {
        Self {
            description: Some(description.into()),
            estimated_at,
        }
    }
}
