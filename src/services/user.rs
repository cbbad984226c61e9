use std::sync::Arc;

use crate::auth::{Credentials, PasswordHasher, TokenService};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::repositories::UserRepository;

/// Registration, login and promotion on top of a [`UserRepository`].
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
        }
    }

    /// Registers a user, making the very first one an admin.
    ///
    /// The user count and the insert are separate store calls, so two
    /// simultaneous first registrations can both come out as admin. Username
    /// uniqueness is still decided by the store alone.
    pub async fn register(&self, credentials: Credentials) -> Result<User, AppError> {
        let is_admin = self.repo.count().await? == 0;
        let password_hash = self.hash(credentials.password).await?;

        let user = self
            .repo
            .register_user(NewUser {
                username: credentials.username,
                password_hash,
                is_admin,
            })
            .await?;

        log::info!("registered user '{}' (admin: {})", user.username, user.is_admin);
        Ok(user)
    }

    /// Checks the password and issues a token carrying the stored admin flag.
    pub async fn login(&self, credentials: Credentials) -> Result<String, AppError> {
        let user = self
            .repo
            .get_user(&credentials.username)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::UserNotFound,
                other => other,
            })?;

        if !self
            .verify(user.password_hash.clone(), credentials.password)
            .await?
        {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username, user.is_admin)?;
        log::info!("user '{}' logged in", user.username);
        Ok(token)
    }

    /// Grants admin to an existing user. Tokens already issued keep their claims.
    pub async fn promote(&self, username: &str) -> Result<(), AppError> {
        self.repo.promote_user(username).await
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Hashing(format!("hashing task failed: {}", e)))?
    }

    async fn verify(&self, hash: String, password: String) -> Result<bool, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| AppError::Hashing(format!("verification task failed: {}", e)))
    }
}
