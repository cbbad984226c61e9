use crate::{
    auth::{AuthMiddleware, AuthResponse, AuthenticatedUser, Credentials, PromoteQuery},
    error::AppError,
    models::UserResponse,
    services::UserService,
};
use actix_web::{patch, post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// The first user ever registered becomes an admin.
///
/// ## Responses:
/// - `201 Created`: the stored user, without its password.
/// - `400 Bad Request`: malformed JSON or missing fields.
/// - `409 Conflict`: the username is taken.
#[post("/register")]
pub async fn register(
    users: web::Data<UserService>,
    register_data: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = users.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{message, token}`.
/// - `401 Unauthorized`: wrong password.
/// - `404 Not Found`: unknown username.
#[post("/login")]
pub async fn login(
    users: web::Data<UserService>,
    login_data: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let token = users.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "User logged in successfully".to_string(),
        token,
    }))
}

/// Promote a user to admin (`?username=`). Admin only.
#[patch("/promote", wrap = "AuthMiddleware::admin()")]
pub async fn promote(
    users: web::Data<UserService>,
    query: web::Query<PromoteQuery>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    users.promote(&query.username).await?;
    log::info!("'{}' promoted by '{}'", query.username, caller.0.username);
    Ok(HttpResponse::NoContent().finish())
}
