pub mod task;
pub mod user;

pub use task::{Task, TaskFields, TaskInput, TaskStatus};
pub use user::{NewUser, User, UserResponse};
