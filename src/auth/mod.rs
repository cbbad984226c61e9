pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use gate::authorize;
pub use middleware::AuthMiddleware;
pub use password::{BcryptHasher, PasswordHasher};
pub use token::{is_admin, Claims, TokenService};

/// Username and password, as sent to both `/register` and `/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required."))]
    pub password: String,
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    /// The signed access token.
    pub token: String,
}

/// Query string of `/promote`.
#[derive(Debug, Deserialize, Validate)]
pub struct PromoteQuery {
    #[validate(length(min = 1, message = "username is required."))]
    pub username: String,
}
