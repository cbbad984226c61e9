//! Process-local backends.
//!
//! Each store keeps its records behind a single mutex, so the username check
//! and the insert happen atomically and concurrent registrations of one
//! username yield exactly one success.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use futures::future::ready;
use uuid::Uuid;

use super::{
    insert_with_fresh_id, task_not_found, user_not_found, IdSource, InsertError, TaskRepository,
    UserRepository,
};
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskFields, User};

fn locked<'a, T>(store: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, AppError> {
    store
        .lock()
        .map_err(|_| AppError::Storage(format!("{} store lock poisoned", name)))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
    ids: IdSource,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: IdSource) -> Self {
        Self {
            users: Mutex::default(),
            ids,
        }
    }

    fn try_insert(&self, id: Uuid, user: &NewUser) -> Result<User, InsertError> {
        let mut users = locked(&self.users, "user").map_err(InsertError::Store)?;

        if users.values().any(|existing| existing.username == user.username) {
            return Err(InsertError::DuplicateUsername);
        }
        if users.contains_key(&id) {
            return Err(InsertError::IdCollision);
        }

        let stored = user.clone().with_id(id);
        users.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self) -> Result<u64, AppError> {
        Ok(locked(&self.users, "user")?.len() as u64)
    }

    async fn register_user(&self, user: NewUser) -> Result<User, AppError> {
        insert_with_fresh_id(&self.ids, |id| ready(self.try_insert(id, &user))).await
    }

    async fn get_user(&self, username: &str) -> Result<User, AppError> {
        locked(&self.users, "user")?
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or_else(user_not_found)
    }

    async fn promote_user(&self, username: &str) -> Result<(), AppError> {
        let mut users = locked(&self.users, "user")?;
        let user = users
            .values_mut()
            .find(|user| user.username == username)
            .ok_or_else(user_not_found)?;
        user.is_admin = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<Uuid, Task>>,
    ids: IdSource,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: IdSource) -> Self {
        Self {
            tasks: Mutex::default(),
            ids,
        }
    }

    fn try_insert(&self, id: Uuid, fields: &TaskFields) -> Result<Task, InsertError> {
        let mut tasks = locked(&self.tasks, "task").map_err(InsertError::Store)?;
        if tasks.contains_key(&id) {
            return Err(InsertError::IdCollision);
        }
        let task = Task::new(id, fields.clone());
        tasks.insert(id, task.clone());
        Ok(task)
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn add(&self, fields: TaskFields) -> Result<Task, AppError> {
        insert_with_fresh_id(&self.ids, |id| ready(self.try_insert(id, &fields))).await
    }

    async fn get_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(locked(&self.tasks, "task")?.values().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task, AppError> {
        locked(&self.tasks, "task")?
            .get(&id)
            .cloned()
            .ok_or_else(task_not_found)
    }

    async fn update(&self, id: Uuid, fields: TaskFields) -> Result<Task, AppError> {
        let mut tasks = locked(&self.tasks, "task")?;
        let task = tasks.get_mut(&id).ok_or_else(task_not_found)?;
        *task = Task::new(id, fields);
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        locked(&self.tasks, "task")?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(task_not_found)
    }
}
