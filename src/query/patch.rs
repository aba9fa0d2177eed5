//! Compiles a sparse [`TaskPatch`] into an owner-scoped `SET ... WHERE ...`
//! fragment for `UPDATE tasks`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::{CompiledQuery, ParamList, SqlParam};
use crate::models::{TaskPatch, TaskPriority};
use crate::validation::{clean_text, future_due_date, FieldError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("no updatable fields were supplied")]
    Empty,
    #[error(transparent)]
    Invalid(#[from] FieldError),
}

/// Builds `SET col = $1, ..., updated_at = $k WHERE user_id = $k+1 AND id = $k+2`.
///
/// Only supplied fields are assigned, in the order title, due, priority,
/// category, completed. An explicitly empty text field is rejected rather
/// than skipped. `updated_at` is always refreshed to `now`.
pub fn compile_patch(
    owner_id: i32,
    task_id: Uuid,
    patch: &TaskPatch,
    now: DateTime<Utc>,
) -> Result<CompiledQuery, PatchError> {
    if patch.is_empty() {
        return Err(PatchError::Empty);
    }

    let mut params = ParamList::default();
    let mut assignments = Vec::new();

    if let Some(title) = &patch.title {
        let title = clean_text("title", title)?;
        assignments.push(format!("title = {}", params.push(SqlParam::Text(title))));
    }
    if let Some(due) = &patch.due {
        let due = future_due_date("due", due, now.naive_utc())?;
        assignments.push(format!("due_date = {}", params.push(SqlParam::Timestamp(due))));
    }
    if let Some(priority) = &patch.priority {
        let priority = TaskPriority::parse_field("priority", priority)?;
        assignments.push(format!(
            "priority = {}",
            params.push(SqlParam::Priority(priority))
        ));
    }
    if let Some(category) = &patch.category {
        let category = clean_text("category", category)?;
        assignments.push(format!("category = {}", params.push(SqlParam::Text(category))));
    }
    if let Some(completed) = patch.completed {
        assignments.push(format!("completed = {}", params.push(SqlParam::Bool(completed))));
    }
    assignments.push(format!("updated_at = {}", params.push(SqlParam::TimestampTz(now))));

    let owner = params.push(SqlParam::Int(owner_id));
    let id = params.push(SqlParam::Uuid(task_id));
    let sql = format!(
        "SET {} WHERE user_id = {owner} AND id = {id}",
        assignments.join(", ")
    );

    Ok(CompiledQuery {
        sql,
        params: params.into_inner(),
    })
}
