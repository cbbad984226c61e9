//! Storage contracts for users and tasks, with the helpers shared by every backend.
//!
//! Services only see [`UserRepository`] and [`TaskRepository`]. Backends translate
//! their own failures into [`AppError`] here: duplicate usernames become
//! `DuplicateUsername`, zero-match updates and deletes become `NotFound`, and
//! everything else is `Storage`.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFields, User};

pub use memory::{InMemoryTaskRepository, InMemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

/// Upper bound on identifier regenerations for a single insert.
pub const MAX_ID_ATTEMPTS: usize = 64;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Number of users currently stored.
    async fn count(&self) -> Result<u64, AppError>;

    /// Stores the user under a freshly generated identifier.
    async fn register_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_user(&self, username: &str) -> Result<User, AppError>;

    /// Sets the admin flag. `NotFound` when no user matched.
    async fn promote_user(&self, username: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores the task under a freshly generated identifier.
    async fn add(&self, fields: TaskFields) -> Result<Task, AppError>;

    async fn get_all(&self) -> Result<Vec<Task>, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Task, AppError>;

    /// Replaces every field of the task. `NotFound` when no task matched.
    async fn update(&self, id: Uuid, fields: TaskFields) -> Result<Task, AppError>;

    /// `NotFound` when nothing was removed.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

pub(crate) fn task_not_found() -> AppError {
    AppError::NotFound("task not found".into())
}

pub(crate) fn user_not_found() -> AppError {
    AppError::NotFound("username not found".into())
}

/// Generator for record identifiers.
#[derive(Clone)]
pub struct IdSource(Arc<dyn Fn() -> Uuid + Send + Sync>);

impl IdSource {
    /// Random v4 UUIDs.
    pub fn random() -> Self {
        Self(Arc::new(Uuid::new_v4))
    }

    pub fn from_fn<F>(generate: F) -> Self
    where
        F: Fn() -> Uuid + Send + Sync + 'static,
    {
        Self(Arc::new(generate))
    }

    pub fn next(&self) -> Uuid {
        (self.0)()
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::random()
    }
}

/// Outcome of a single insert attempt.
#[derive(Debug)]
pub enum InsertError {
    /// The generated identifier is already in use.
    IdCollision,
    /// The username is already in use.
    DuplicateUsername,
    Store(AppError),
}

/// Runs `insert` with a fresh identifier until it no longer collides.
///
/// Identifier collisions never reach the caller unless `MAX_ID_ATTEMPTS` is
/// exhausted. A duplicate username is returned on the first attempt.
pub async fn insert_with_fresh_id<T, F, Fut>(ids: &IdSource, mut insert: F) -> Result<T, AppError>
where
    F: FnMut(Uuid) -> Fut,
    Fut: Future<Output = Result<T, InsertError>>,
{
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let id = ids.next();
        match insert(id).await {
            Ok(stored) => return Ok(stored),
            Err(InsertError::IdCollision) => {
                log::debug!("identifier {} already taken (attempt {}), regenerating", id, attempt);
            }
            Err(InsertError::DuplicateUsername) => return Err(AppError::DuplicateUsername),
            Err(InsertError::Store(err)) => return Err(err),
        }
    }

    Err(AppError::Storage(format!(
        "no free identifier after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

/// Bounds a store operation; running past `limit` is a storage failure.
pub async fn within<T, Fut>(limit: Duration, operation: Fut) -> Result<T, AppError>
where
    Fut: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| AppError::Storage(format!("store operation timed out after {:?}", limit)))?
}
