use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        completion_time, PaginatedTasks, SortField, Task, TaskInput, TaskQuery, TaskRow,
        TaskStatusUpdate, NOT_COMPLETED_TASK_STATUS_ID,
    },
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.task_status_id, \
     s.name AS task_status_name, t.user_id, t.created_at, t.updated_at, \
     t.complete_before, t.completed_at \
     FROM tasks t JOIN cl_task_status s ON s.id = t.task_status_id";

/// Escapes `LIKE` wildcards so a title filter matches literally.
fn like_pattern(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

async fn fetch_owned_task(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<TaskRow, AppError> {
    sqlx::query_as::<_, TaskRow>(&format!("{} WHERE t.id = $1 AND t.user_id = $2", TASK_SELECT))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

async fn ensure_status_exists(pool: &PgPool, task_status_id: i32) -> Result<(), AppError> {
    let status = sqlx::query_as::<_, (i32,)>("SELECT id FROM cl_task_status WHERE id = $1")
        .bind(task_status_id)
        .fetch_optional(pool)
        .await?;

    match status {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "Unknown task status: {}",
            task_status_id
        ))),
    }
}

/// Retrieves a page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `title` (optional): case-insensitive substring of the title.
/// - `task_status_id` (optional): only tasks in this status.
/// - `sort_field` (optional): `title`, `created_at`, `updated_at`,
///   `complete_before` or `completed_at`. Defaults to `created_at`.
/// - `sort_direction` (optional): `asc` or `desc` (default).
/// - `limit` (1..=100, default 10) and `offset` (default 0).
///
/// ## Responses:
/// - `200 OK`: `{count, results}` where `count` ignores `limit` and `offset`.
/// - `401 Unauthorized`: missing or invalid access token.
/// - `422 Unprocessable Entity`: `limit` or `offset` out of range.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;
    let user_id = user.0.id;

    let mut conditions = vec![String::from("t.user_id = $1")];
    let mut param_count = 2;

    if query_params.title.is_some() {
        conditions.push(format!("t.title ILIKE ${}", param_count));
        param_count += 1;
    }
    if query_params.task_status_id.is_some() {
        conditions.push(format!("t.task_status_id = ${}", param_count));
        param_count += 1;
    }
    let where_clause = conditions.join(" AND ");

    let title_pattern = query_params.title.as_deref().map(like_pattern);

    let count_sql = format!("SELECT COUNT(*) FROM tasks t WHERE {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql).bind(user_id);
    if let Some(pattern) = &title_pattern {
        count_query = count_query.bind(pattern);
    }
    if let Some(task_status_id) = query_params.task_status_id {
        count_query = count_query.bind(task_status_id);
    }
    let (count,) = count_query.fetch_one(&**pool).await?;

    let sort_column = query_params
        .sort_field
        .unwrap_or(SortField::CreatedAt)
        .column();
    let list_sql = format!(
        "{} WHERE {} ORDER BY {} {} NULLS LAST, t.id LIMIT ${} OFFSET ${}",
        TASK_SELECT,
        where_clause,
        sort_column,
        query_params.sort_direction.keyword(),
        param_count,
        param_count + 1
    );
    let mut list_query = sqlx::query_as::<_, TaskRow>(&list_sql).bind(user_id);
    if let Some(pattern) = &title_pattern {
        list_query = list_query.bind(pattern);
    }
    if let Some(task_status_id) = query_params.task_status_id {
        list_query = list_query.bind(task_status_id);
    }
    let rows = list_query
        .bind(query_params.limit)
        .bind(query_params.offset)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedTasks {
        count,
        results: rows.into_iter().map(Task::from).collect(),
    }))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the created `Task`.
/// - `400 Bad Request`: unknown `task_status_id`.
/// - `401 Unauthorized`: missing or invalid access token.
/// - `422 Unprocessable Entity`: `title` or `description` too short or long.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    ensure_status_exists(&pool, task_data.task_status_id).await?;

    let task = task_data.into_inner();
    let now = Utc::now();
    let completed_at = completion_time(
        NOT_COMPLETED_TASK_STATUS_ID,
        task.task_status_id,
        task.completed_at,
        now,
    );

    let (task_id,) = sqlx::query_as::<_, (Uuid,)>(
        "INSERT INTO tasks (id, title, description, task_status_id, user_id, created_at, complete_before, completed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.task_status_id)
    .bind(user.0.id)
    .bind(now)
    .bind(task.complete_before)
    .bind(completed_at)
    .fetch_one(&**pool)
    .await?;

    let created = fetch_owned_task(&pool, task_id, user.0.id).await?;
    log::info!("user {} created task {}", user.0.id, task_id);

    Ok(HttpResponse::Created().json(Task::from(created)))
}

/// Retrieves one task.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `401 Unauthorized`: missing or invalid access token.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = fetch_owned_task(&pool, task_id.into_inner(), user.0.id).await?;
    Ok(HttpResponse::Ok().json(Task::from(task)))
}

/// Replaces every editable field of a task.
///
/// Moving the task from "not completed" to "completed" without a
/// `completed_at` stamps the current time.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: unknown `task_status_id`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
/// - `422 Unprocessable Entity`: input validation failed.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_uuid = task_id.into_inner();
    let current = fetch_owned_task(&pool, task_uuid, user.0.id).await?;
    ensure_status_exists(&pool, task_data.task_status_id).await?;

    let now = Utc::now();
    let completed_at = completion_time(
        current.task_status_id,
        task_data.task_status_id,
        task_data.completed_at,
        now,
    );

    sqlx::query(
        "UPDATE tasks
         SET title = $1, description = $2, task_status_id = $3, complete_before = $4,
             completed_at = $5, updated_at = $6
         WHERE id = $7 AND user_id = $8",
    )
    .bind(&task_data.title)
    .bind(&task_data.description)
    .bind(task_data.task_status_id)
    .bind(task_data.complete_before)
    .bind(completed_at)
    .bind(now)
    .bind(task_uuid)
    .bind(user.0.id)
    .execute(&**pool)
    .await?;

    let updated = fetch_owned_task(&pool, task_uuid, user.0.id).await?;
    Ok(HttpResponse::Ok().json(Task::from(updated)))
}

/// Changes only the status of a task.
///
/// The completion rule of [`update_task`] applies; an existing
/// `completed_at` is kept.
#[patch("/{id}")]
pub async fn update_task_status(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    status_data: web::Json<TaskStatusUpdate>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();
    let current = fetch_owned_task(&pool, task_uuid, user.0.id).await?;
    ensure_status_exists(&pool, status_data.task_status_id).await?;

    let now = Utc::now();
    let completed_at = completion_time(
        current.task_status_id,
        status_data.task_status_id,
        current.completed_at,
        now,
    );

    sqlx::query(
        "UPDATE tasks SET task_status_id = $1, completed_at = $2, updated_at = $3
         WHERE id = $4 AND user_id = $5",
    )
    .bind(status_data.task_status_id)
    .bind(completed_at)
    .bind(now)
    .bind(task_uuid)
    .bind(user.0.id)
    .execute(&**pool)
    .await?;

    let updated = fetch_owned_task(&pool, task_uuid, user.0.id).await?;
    Ok(HttpResponse::Ok().json(Task::from(updated)))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `401 Unauthorized`: missing or invalid access token.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(user.0.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
