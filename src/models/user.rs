use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored user. `password_hash` never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// A user about to be stored: the password is already hashed and the admin
/// flag already decided, but no identifier has been assigned yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn with_id(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
        }
    }
}

/// Public view of a user returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}
