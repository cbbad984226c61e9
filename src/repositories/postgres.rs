//! Postgres backends over a shared `PgPool`.
//!
//! Every call runs under the configured store timeout. Unique violations are
//! classified by the violated constraint name, never by error text.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    insert_with_fresh_id, task_not_found, user_not_found, within, IdSource, InsertError,
    TaskRepository, UserRepository,
};
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFields, TaskStatus, User};

pub const USERS_PKEY: &str = "users_pkey";
pub const USERNAME_KEY: &str = "users_username_key";
pub const TASKS_PKEY: &str = "tasks_pkey";

/// SQLSTATE `duplicate_table`, also raised for an existing index.
const DUPLICATE_RELATION: &str = "42P07";

fn storage(error: sqlx::Error) -> AppError {
    AppError::Storage(error.to_string())
}

/// Maps the constraint named in a unique violation to an insert outcome.
pub fn classify_unique_violation(constraint: Option<&str>) -> InsertError {
    match constraint {
        Some(USERS_PKEY) | Some(TASKS_PKEY) => InsertError::IdCollision,
        Some(USERNAME_KEY) => InsertError::DuplicateUsername,
        other => InsertError::Store(AppError::Storage(format!(
            "unexpected unique violation on {}",
            other.unwrap_or("unnamed constraint")
        ))),
    }
}

fn insert_error(error: sqlx::Error) -> InsertError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            return classify_unique_violation(db.constraint());
        }
    }
    InsertError::Store(storage(error))
}

/// `true` when the error only says that the object was created concurrently.
fn already_exists(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.code().as_deref() == Some(DUPLICATE_RELATION)
        }
        _ => false,
    }
}

async fn execute_ddl(pool: &PgPool, statement: &str) -> Result<(), AppError> {
    match sqlx::query(statement).execute(pool).await {
        Ok(_) => Ok(()),
        Err(e) if already_exists(&e) => {
            log::info!("schema object already created by another process");
            Ok(())
        }
        Err(e) => Err(storage(e)),
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_admin: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
        }
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: String,
    due_date: DateTime<Utc>,
    status: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status: TaskStatus = row.status.parse().map_err(|_| {
            AppError::Storage(format!("task {} has unrecognised status '{}'", row.id, row.status))
        })?;
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
    ids: IdSource,
}

impl PgUserRepository {
    /// Connects the repository and makes sure the username uniqueness index
    /// exists before any write is accepted.
    pub async fn new(pool: PgPool, timeout: Duration) -> Result<Self, AppError> {
        let repo = Self {
            pool,
            timeout,
            ids: IdSource::random(),
        };
        within(timeout, repo.ensure_schema()).await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), AppError> {
        execute_ddl(
            &self.pool,
            "CREATE TABLE IF NOT EXISTS users (
                id UUID NOT NULL,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_admin BOOLEAN NOT NULL DEFAULT FALSE,
                CONSTRAINT users_pkey PRIMARY KEY (id)
            )",
        )
        .await?;

        if self.username_index_exists().await? {
            log::info!("username index already exists");
            return Ok(());
        }

        log::info!("creating unique index {} on users(username)", USERNAME_KEY);
        execute_ddl(
            &self.pool,
            "CREATE UNIQUE INDEX users_username_key ON users (username)",
        )
        .await?;

        // A tolerated failure may come from rows that already share a username.
        if !self.username_index_exists().await? {
            return Err(AppError::Storage(format!(
                "unique index {} is missing after setup; users may already hold duplicate usernames",
                USERNAME_KEY
            )));
        }
        Ok(())
    }

    async fn username_index_exists(&self) -> Result<bool, AppError> {
        sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (
                SELECT 1 FROM pg_indexes
                WHERE schemaname = current_schema() AND tablename = 'users' AND indexname = $1
            )",
        )
        .bind(USERNAME_KEY)
        .fetch_one(&self.pool)
        .await
        .map(|(exists,)| exists)
        .map_err(storage)
    }

    async fn insert(&self, id: Uuid, user: &NewUser) -> Result<User, InsertError> {
        sqlx::query("INSERT INTO users (id, username, password_hash, is_admin) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .execute(&self.pool)
            .await
            .map_err(insert_error)?;

        Ok(user.clone().with_id(id))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn count(&self) -> Result<u64, AppError> {
        within(self.timeout, async {
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await
                .map(|(count,)| count as u64)
                .map_err(storage)
        })
        .await
    }

    async fn register_user(&self, user: NewUser) -> Result<User, AppError> {
        within(
            self.timeout,
            insert_with_fresh_id(&self.ids, |id| self.insert(id, &user)),
        )
        .await
    }

    async fn get_user(&self, username: &str) -> Result<User, AppError> {
        within(self.timeout, async {
            sqlx::query_as::<_, UserRow>(
                "SELECT id, username, password_hash, is_admin FROM users WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(User::from)
            .ok_or_else(user_not_found)
        })
        .await
    }

    async fn promote_user(&self, username: &str) -> Result<(), AppError> {
        within(self.timeout, async {
            let result = sqlx::query("UPDATE users SET is_admin = TRUE WHERE username = $1")
                .bind(username)
                .execute(&self.pool)
                .await
                .map_err(storage)?;

            if result.rows_affected() == 0 {
                return Err(user_not_found());
            }
            Ok(())
        })
        .await
    }
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
    timeout: Duration,
    ids: IdSource,
}

impl PgTaskRepository {
    pub async fn new(pool: PgPool, timeout: Duration) -> Result<Self, AppError> {
        let repo = Self {
            pool,
            timeout,
            ids: IdSource::random(),
        };
        within(
            timeout,
            execute_ddl(
                &repo.pool,
                "CREATE TABLE IF NOT EXISTS tasks (
                    id UUID NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    due_date TIMESTAMPTZ NOT NULL,
                    status TEXT NOT NULL,
                    CONSTRAINT tasks_pkey PRIMARY KEY (id)
                )",
            ),
        )
        .await?;
        Ok(repo)
    }

    async fn insert(&self, id: Uuid, fields: &TaskFields) -> Result<Task, InsertError> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, due_date, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.due_date)
        .bind(fields.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(Task::new(id, fields.clone()))
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn add(&self, fields: TaskFields) -> Result<Task, AppError> {
        within(
            self.timeout,
            insert_with_fresh_id(&self.ids, |id| self.insert(id, &fields)),
        )
        .await
    }

    async fn get_all(&self) -> Result<Vec<Task>, AppError> {
        within(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(
                "SELECT id, title, description, due_date, status FROM tasks",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task, AppError> {
        within(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(
                "SELECT id, title, description, due_date, status FROM tasks WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or_else(task_not_found)
            .and_then(Task::try_from)
        })
        .await
    }

    async fn update(&self, id: Uuid, fields: TaskFields) -> Result<Task, AppError> {
        within(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(
                "UPDATE tasks
                 SET title = $1, description = $2, due_date = $3, status = $4
                 WHERE id = $5
                 RETURNING id, title, description, due_date, status",
            )
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.due_date)
            .bind(fields.status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or_else(task_not_found)
            .and_then(Task::try_from)
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        within(self.timeout, async {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage)?;

            if result.rows_affected() == 0 {
                return Err(task_not_found());
            }
            Ok(())
        })
        .await
    }
}
