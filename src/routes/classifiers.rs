use crate::{error::AppError, models::TaskStatus};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// Lists the task status classifier.
#[get("/task_status")]
pub async fn get_task_statuses(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let statuses = sqlx::query_as::<_, TaskStatus>("SELECT id, name FROM cl_task_status ORDER BY id")
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(statuses))
}
