use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskFields, TaskInput, TaskStatus};
use crate::repositories::TaskRepository;

/// Task CRUD with status validation ahead of every write.
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn add(&self, input: TaskInput) -> Result<Task, AppError> {
        let task = self.repo.add(validated(input)?).await?;
        log::info!("created task {}", task.id);
        Ok(task)
    }

    pub async fn get_all(&self) -> Result<Vec<Task>, AppError> {
        self.repo.get_all().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Task, AppError> {
        self.repo.get_by_id(id).await
    }

    pub async fn update(&self, id: Uuid, input: TaskInput) -> Result<Task, AppError> {
        self.repo.update(id, validated(input)?).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(id).await
    }
}

/// Resolves the raw status to its canonical value; nothing else is checked here.
fn validated(input: TaskInput) -> Result<TaskFields, AppError> {
    let status: TaskStatus = input.status.parse()?;
    Ok(TaskFields {
        title: input.title,
        description: input.description,
        due_date: input.due_date,
        status,
    })
}
