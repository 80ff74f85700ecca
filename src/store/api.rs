//! The remote side of the board: the task, project, and identity services
//! the client talks to. `HttpApi`, `LocalApi`, and `MemoryApi` implement
//! these traits.

use async_trait::async_trait;

use crate::io::lock::LockError;
use crate::model::{NewProject, NewTask, Project, ProjectPatch, Task, TaskFilter, TaskPatch, TaskUpdate, User};

/// Error type for remote calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },
    /// The server refused the request as a whole (nothing was applied)
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
    #[error("server sent no data for {0}")]
    EmptyResponse(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError>;

    async fn get_task(&self, id: &str) -> Result<Task, ApiError>;

    async fn create_task(&self, new: &NewTask) -> Result<Task, ApiError>;

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;

    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;

    /// Apply a reorder batch atomically. Returns the project's tasks as the
    /// server now has them (possibly only the affected subset).
    async fn reorder_tasks(&self, project_id: &str, updates: &[TaskUpdate]) -> Result<Vec<Task>, ApiError>;
}

#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn get_project(&self, id: &str) -> Result<Project, ApiError>;

    async fn create_project(&self, new: &NewProject) -> Result<Project, ApiError>;

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError>;

    async fn delete_project(&self, id: &str) -> Result<(), ApiError>;
}

/// Who is signed in
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// Everything a board client needs from its backend
pub trait Remote: TaskApi + ProjectApi + SessionApi {}

impl<T: TaskApi + ProjectApi + SessionApi> Remote for T {}
