//!
//! # Custom Error Handling
//!
//! This module defines the `AppError` type shared by every layer of the service.
//! Repositories translate storage driver failures into it, services add the
//! business conditions (duplicate usernames, bad statuses, bad credentials), and
//! the HTTP layer renders it.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! `Result<_, AppError>` and let Actix Web produce a JSON body of the form
//! `{"error": "...", "kind": "..."}` with the matching status code.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Every failure kind the service can report.
///
/// The storage, hashing and signing variants carry internal detail for the logs.
/// That detail is never sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// No `Authorization` header on a protected route (HTTP 401).
    #[error("authorization header is required")]
    MissingCredential,
    /// The `Authorization` header is not `Bearer <token>` (HTTP 401).
    #[error("invalid authorization header")]
    MalformedCredential,
    /// Bad signature, wrong algorithm, malformed or expired token (HTTP 401).
    #[error("{0}")]
    InvalidToken(String),
    /// Valid token without the admin claim on an admin route (HTTP 403).
    #[error("Forbidden")]
    Forbidden,
    /// Username already taken (HTTP 409).
    #[error("username already exists")]
    DuplicateUsername,
    /// A task or user addressed by id/username does not exist (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// Login for an unknown username (HTTP 404).
    #[error("user not found")]
    UserNotFound,
    /// Task status outside the recognised set (HTTP 400).
    #[error("invalid status '{0}', expected one of: pending, in progress, completed")]
    InvalidStatus(String),
    /// Password did not match the stored hash (HTTP 401).
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Malformed request body, path or query (HTTP 400).
    #[error("{0}")]
    BadRequest(String),
    /// Field-level validation failure (HTTP 422).
    #[error("{0}")]
    Validation(String),
    /// Any store failure that is not a recognised domain condition (HTTP 500).
    #[error("storage failure: {0}")]
    Storage(String),
    /// Password hashing failed (HTTP 500).
    #[error("hashing failure: {0}")]
    Hashing(String),
    /// Token signing failed (HTTP 500).
    #[error("signing failure: {0}")]
    Signing(String),
    /// The application was assembled without a required component (HTTP 500).
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl AppError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "missing_credential",
            AppError::MalformedCredential => "malformed_credential",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::DuplicateUsername => "duplicate_username",
            AppError::NotFound(_) => "not_found",
            AppError::UserNotFound => "user_not_found",
            AppError::InvalidStatus(_) => "invalid_status",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::BadRequest(_) => "bad_request",
            AppError::Validation(_) => "validation",
            AppError::Storage(_) => "storage_failure",
            AppError::Hashing(_) => "hashing_failure",
            AppError::Signing(_) => "signing_failure",
            AppError::Configuration(_) => "configuration_failure",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_)
                | AppError::Hashing(_)
                | AppError::Signing(_)
                | AppError::Configuration(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::MalformedCredential
            | AppError::InvalidToken(_)
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidStatus(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_)
            | AppError::Hashing(_)
            | AppError::Signing(_)
            | AppError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Internal failures are logged with their detail and answered generically.
    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("{}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "kind": self.kind(),
        }))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}
