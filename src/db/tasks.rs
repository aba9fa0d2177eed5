use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::timed;
use crate::error::AppError;
use crate::models::{Task, ValidatedTask};
use crate::query::{bind_params, compile_filter, CompiledQuery, TaskFilter};

/// Column list for `tasks` SELECT and RETURNING clauses.
const COLUMNS: &str = "\
    id, user_id, title, completed, due_date, \
    created_at, updated_at, priority, category";

/// Owner-scoped access to the `tasks` table. Every statement filters on
/// `user_id`, so a task owned by someone else looks exactly like a missing
/// one.
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
    timeout: Duration,
}

impl TaskRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn list(&self, owner_id: i32, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let compiled = compile_filter(owner_id, filter);
        let sql = format!("SELECT {COLUMNS} FROM tasks {}", compiled.sql);
        log::debug!("Listing tasks: {}", sql);

        let query = bind_params(sqlx::query_as::<_, Task>(&sql), compiled.params);
        timed(self.timeout, query.fetch_all(&self.pool)).await
    }

    pub async fn create(
        &self,
        owner_id: i32,
        task: ValidatedTask,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (id, user_id, title, due_date, priority, category, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {COLUMNS}"
        );
        let query = sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(task.title)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.category)
            .bind(now);
        timed(self.timeout, query.fetch_one(&self.pool)).await
    }

    pub async fn find(&self, owner_id: i32, task_id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE user_id = $1 AND id = $2");
        let query = sqlx::query_as::<_, Task>(&sql).bind(owner_id).bind(task_id);
        timed(self.timeout, query.fetch_optional(&self.pool)).await
    }

    /// Whether `owner_id` already has a task titled `title`, ignoring the
    /// task `except` when given.
    pub async fn title_taken(
        &self,
        owner_id: i32,
        title: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let query = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                 SELECT 1 FROM tasks \
                 WHERE user_id = $1 AND title = $2 AND ($3::uuid IS NULL OR id <> $3)\
             )",
        )
        .bind(owner_id)
        .bind(title)
        .bind(except);
        timed(self.timeout, query.fetch_one(&self.pool)).await
    }

    /// Runs a compiled patch. `None` means no row matched the owner and id.
    pub async fn apply_patch(&self, patch: CompiledQuery) -> Result<Option<Task>, AppError> {
        let sql = format!("UPDATE tasks {} RETURNING {COLUMNS}", patch.sql);
        let query = bind_params(sqlx::query_as::<_, Task>(&sql), patch.params);
        timed(self.timeout, query.fetch_optional(&self.pool)).await
    }

    /// Returns `false` when no row matched the owner and id.
    pub async fn delete(&self, owner_id: i32, task_id: Uuid) -> Result<bool, AppError> {
        let query = sqlx::query("DELETE FROM tasks WHERE user_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(task_id);
        let result = timed(self.timeout, query.execute(&self.pool)).await?;
        Ok(result.rows_affected() > 0)
    }
}
