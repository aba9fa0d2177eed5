use std::collections::HashMap;

use crate::{
    auth::AuthenticatedIdentity,
    db::TaskRepository,
    error::AppError,
    models::{NewTask, TaskPatch},
    query::{compile_patch, TaskFilter},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

/// Lists the caller's tasks.
///
/// ## Query Parameters:
/// - `completed`: boolean literal.
/// - `category`: exact category.
/// - `due`: `YYYY-MM-DD HH:MM:SS`, tasks due at or before it.
/// - `search`: exact title.
/// - `priority`: `low`, `medium` or `high`.
/// - `sort`: column name with an optional `:asc` / `:desc`.
/// - `limit`: non-negative row cap.
///
/// Empty values are ignored. A malformed value answers `422` naming the key.
#[get("")]
pub async fn get_tasks(
    identity: AuthenticatedIdentity,
    tasks: web::Data<TaskRepository>,
    query_params: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter::from_query(&query_params).map_err(|e| {
        log::warn!("Rejected task filter: {}", e);
        e
    })?;
    let found = tasks.list(identity.user_id, &filter).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Creates a task owned by the caller. Titles are unique per owner.
#[post("")]
pub async fn create_task(
    identity: AuthenticatedIdentity,
    tasks: web::Data<TaskRepository>,
    task_data: web::Json<NewTask>,
) -> Result<impl Responder, AppError> {
    let now = Utc::now();
    let task = task_data.into_inner().validate(now.naive_utc())?;

    if tasks.title_taken(identity.user_id, &task.title, None).await? {
        return Err(AppError::Conflict("A task with this title already exists".into()));
    }

    let created = tasks.create(identity.user_id, task, now).await?;
    log::info!("User {} created task {}", identity.user_id, created.id);
    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
pub async fn get_task(
    identity: AuthenticatedIdentity,
    tasks: web::Data<TaskRepository>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&path)?;
    match tasks.find(identity.user_id, task_id).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(task_not_found()),
    }
}

/// Applies a sparse update. Fields absent from the body stay unchanged; a
/// body with no recognized field answers `400`.
#[patch("/{id}")]
pub async fn update_task(
    identity: AuthenticatedIdentity,
    tasks: web::Data<TaskRepository>,
    path: web::Path<String>,
    patch_data: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&path)?;
    let patch = patch_data.into_inner();
    let compiled = compile_patch(identity.user_id, task_id, &patch, Utc::now())?;

    if let Some(title) = &patch.title {
        if tasks
            .title_taken(identity.user_id, title.trim(), Some(task_id))
            .await?
        {
            return Err(AppError::Conflict("A task with this title already exists".into()));
        }
    }

    match tasks.apply_patch(compiled).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(task_not_found()),
    }
}

#[delete("/{id}")]
pub async fn delete_task(
    identity: AuthenticatedIdentity,
    tasks: web::Data<TaskRepository>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&path)?;
    if tasks.delete(identity.user_id, task_id).await? {
        log::info!("User {} deleted task {}", identity.user_id, task_id);
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(task_not_found())
    }
}

// A malformed id can't name an existing task.
fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| task_not_found())
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}
