use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{clean_text, future_due_date, FieldError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Parses the exact lowercase wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }

    pub(crate) fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError> {
        Self::parse(raw.trim())
            .ok_or_else(|| FieldError::new(field, "must be one of: low, medium, high"))
    }
}

/// A task as stored in the `tasks` table and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    /// Owner of the task.
    pub user_id: i32,
    pub title: String,
    pub completed: bool,
    /// Exposed as `due` in the `YYYY-MM-DD HH:MM:SS` literal format.
    #[serde(rename = "due", with = "due_format")]
    pub due_date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub priority: TaskPriority,
    pub category: String,
}

/// Request body for creating a task. All fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub due: String,
    pub priority: String,
    pub category: String,
}

/// A `NewTask` whose fields passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTask {
    pub title: String,
    pub due_date: NaiveDateTime,
    pub priority: TaskPriority,
    pub category: String,
}

impl NewTask {
    /// Trims and validates every field. `now` bounds the due date.
    pub fn validate(self, now: NaiveDateTime) -> Result<ValidatedTask, FieldError> {
        Ok(ValidatedTask {
            title: clean_text("title", &self.title)?,
            due_date: future_due_date("due", &self.due, now)?,
            priority: TaskPriority::parse_field("priority", &self.priority)?,
            category: clean_text("category", &self.category)?,
        })
    }
}

/// Sparse update document for `PATCH /tasks/{id}`.
///
/// `None` leaves a column untouched; `Some("")` is an explicit (and
/// rejected) empty value. Unknown JSON fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.completed.is_none()
    }
}

mod due_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::validation::DUE_DATE_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(DUE_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DUE_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
