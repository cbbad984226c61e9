use crate::{
    auth::{AuthMiddleware, AuthenticatedUser},
    error::AppError,
    models::TaskInput,
    services::TaskService,
};
use actix_web::{delete, get, http::header, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Lists every task.
///
/// ## Responses:
/// - `200 OK`: a JSON array of tasks.
/// - `401 Unauthorized`: missing, malformed or invalid token.
#[get("", wrap = "AuthMiddleware::authenticated()")]
pub async fn get_tasks(tasks: web::Data<TaskService>) -> Result<impl Responder, AppError> {
    let tasks = tasks.get_all().await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task from `{title, description, due_date, status}`. Admin only.
///
/// The status is matched case-insensitively and stored in canonical form.
///
/// ## Responses:
/// - `201 Created`: the stored task, with `Location: /tasks/{id}`.
/// - `400 Bad Request`: malformed body or unknown status.
/// - `403 Forbidden`: the caller is not an admin.
#[post("", wrap = "AuthMiddleware::admin()")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    task_data: web::Json<TaskInput>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.add(task_data.into_inner()).await?;
    log::debug!("task {} created by '{}'", task.id, caller.0.username);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/tasks/{}", task.id)))
        .json(task))
}

/// Fetches one task by id.
#[get("/{id}", wrap = "AuthMiddleware::authenticated()")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces every field of a task. Admin only.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: bad id, malformed body or unknown status.
/// - `404 Not Found`: no task with that id.
#[put("/{id}", wrap = "AuthMiddleware::admin()")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.update(path.into_inner(), task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}", wrap = "AuthMiddleware::admin()")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
