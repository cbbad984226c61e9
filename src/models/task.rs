use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Represents the status of a task.
/// Serialized in its canonical lowercase form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[serde(rename = "pending")]
    Pending,
    /// Task is currently being worked on.
    #[serde(rename = "in progress")]
    InProgress,
    /// Task is completed.
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// The canonical stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse; anything outside the three statuses is `InvalidStatus`.
impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| AppError::InvalidStatus(raw.to_string()))
    }
}

/// Input structure for creating or updating a task.
///
/// `status` stays a raw string here; the task service decides whether it is
/// one of the recognised values. Any `id` the client sends is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Required.
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,

    /// The description of the task. Required.
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,

    /// When the task is due.
    pub due_date: DateTime<Utc>,

    /// Requested status, e.g. "Pending" or "in progress".
    #[validate(length(min = 1, message = "Status is required."))]
    pub status: String,
}

/// The validated values of a task, without its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Server-assigned identifier (UUID v4).
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// The description of the task.
    pub description: String,
    /// When the task is due.
    pub due_date: DateTime<Utc>,
    /// The current status of the task.
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: Uuid, fields: TaskFields) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            status: fields.status,
        }
    }
}
