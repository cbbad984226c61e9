//! Request-level access check for protected routes.
//!
//! The procedure runs in order: header present, header shaped as
//! `Bearer <token>`, token valid, and, for admin routes, admin claim set.
//! Each step has its own rejection kind.

use super::token::{is_admin, Claims, TokenService};
use crate::error::AppError;

/// Splits an `Authorization` value into its token part.
///
/// The value must be exactly two space-separated parts, the first equal to
/// "bearer" in any case.
pub fn bearer_token(header: &str) -> Result<&str, AppError> {
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(*token)
        }
        _ => Err(AppError::MalformedCredential),
    }
}

/// Runs the full gate over an optional `Authorization` header value.
pub fn authorize(
    header: Option<&str>,
    tokens: &TokenService,
    require_admin: bool,
) -> Result<Claims, AppError> {
    let header = header.ok_or(AppError::MissingCredential)?;
    let token = bearer_token(header)?;
    let claims = tokens.validate(token)?;

    if require_admin && !is_admin(&claims) {
        log::debug!("'{}' denied: admin claim required", claims.username);
        return Err(AppError::Forbidden);
    }

    Ok(claims)
}
