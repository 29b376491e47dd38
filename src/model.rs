//! Domain types for tasks and their API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Lowercase wire/storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Task completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    /// Lowercase wire/storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }
}

/// Owner identity a task is scoped to.
///
/// Threaded explicitly through every repository call; the configured value
/// is the only owner today, but nothing depends on it being global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id, immutable after creation.
    pub id: String,
    /// Owner the task belongs to.
    pub owner_id: String,
    /// Non-empty trimmed title.
    pub title: String,
    /// Optional free-form notes.
    pub description: Option<String>,
    /// When the task is due, if scheduled.
    pub due_date: Option<DateTime<Utc>>,
    /// When to fire a reminder, if armed.
    pub reminder_at: Option<DateTime<Utc>>,
    /// Set by the dispatch loop once the reminder has been acted upon.
    pub reminder_sent: bool,
    pub priority: Priority,
    /// Ordered, duplicates allowed.
    pub tags: Vec<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a task. Every field except `title` is optional and
/// falls back to the model defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_at: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub status: Option<TaskStatus>,
}

/// Field-level patch for updating a task.
///
/// Nullable fields use a double `Option`: the outer layer distinguishes
/// "field absent" (untouched) from "field present", the inner layer carries
/// null-vs-value. Supplying `reminder_at` in any form rearms the reminder by
/// clearing `reminder_sent`; `reminder_sent` itself is deliberately not
/// patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(deserialize_with = "double_option")]
    pub reminder_at: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub status: Option<TaskStatus>,
}

/// Optional constraints for listing tasks. Doubles as the query-string type
/// for `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Membership match against the tag list.
    pub tag: Option<String>,
}

/// Deserialize a present field (including an explicit null) as `Some`.
/// Combined with `#[serde(default)]`, an absent field stays `None`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
