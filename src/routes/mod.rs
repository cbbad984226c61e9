pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::error::AppError;

/// Registers every route together with the extractor configs that turn
/// malformed bodies, paths and queries into structured 400 responses.
///
/// Expects `web::Data<UserService>`, `web::Data<TaskService>` and
/// `web::Data<TokenService>` to be registered on the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::BadRequest("invalid task ID".into()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(health::health)
    .service(auth::register)
    .service(auth::login)
    .service(auth::promote)
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
