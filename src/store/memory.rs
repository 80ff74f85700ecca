//! In-process task service. `BoardData` holds the server-side rules (id
//! assignment, insert shifting, gap closing, all-or-nothing reorders) and is
//! shared by `MemoryApi` and the file-backed `LocalApi`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::{
    NewProject, NewTask, Project, ProjectPatch, Role, Task, TaskFilter, TaskPatch, TaskStatus,
    TaskUpdate, User,
};
use crate::ops::partition::board_columns;
use crate::ops::reconcile::normalize;

use super::api::{ApiError, ProjectApi, SessionApi, TaskApi};

/// Everything the service stores. Serialized as `board.json` by `LocalApi`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub next_task: usize,
    #[serde(default)]
    pub next_project: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl BoardData {
    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Matching tasks, ordered by project, status, then position
    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
        tasks.sort_by(|a, b| {
            (a.project_id.as_str(), a.status, a.position, a.id.as_str()).cmp(&(
                b.project_id.as_str(),
                b.status,
                b.position,
                b.id.as_str(),
            ))
        });
        tasks
    }

    pub fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("task {}", id)))
    }

    pub fn create_task(&mut self, new: &NewTask) -> Result<Task, ApiError> {
        if new.title.trim().is_empty() {
            return Err(ApiError::Rejected("task title must not be empty".into()));
        }
        self.require_project(&new.project_id)?;

        let status = new.status.unwrap_or(TaskStatus::Todo);
        let column_len = self.column_len(&new.project_id, status);
        let position = new.position.unwrap_or(column_len).min(column_len);

        // Make room at the requested slot
        for task in self
            .tasks
            .iter_mut()
            .filter(|t| t.project_id == new.project_id && t.status == status && t.position >= position)
        {
            task.position += 1;
        }

        self.next_task += 1;
        let mut task = Task::new(
            format!("T-{:03}", self.next_task),
            new.project_id.clone(),
            new.title.trim(),
            status,
            position,
        );
        task.description = new.description.clone();
        task.priority = new.priority.unwrap_or_default();
        task.due_date = new.due_date;
        task.assignee_id = new.assignee_id.clone();
        let now = Utc::now();
        task.created_at = Some(now);
        task.updated_at = Some(now);

        self.tasks.push(task.clone());
        self.normalize_project(&new.project_id);
        self.get_task(&task.id)
    }

    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        if patch.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ApiError::Rejected("task title must not be empty".into()));
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("task {}", id)))?;
        patch.apply_to(task);
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    /// Remove a task and close the gap it leaves in its column
    pub fn delete_task(&mut self, id: &str) -> Result<(), ApiError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("task {}", id)))?;
        let removed = self.tasks.remove(idx);
        self.normalize_project(&removed.project_id);
        Ok(())
    }

    /// Apply a reorder batch. Every id must exist and belong to the project,
    /// otherwise nothing is applied. Positions are renumbered afterwards, so
    /// the stored board is always contiguous whatever the batch said.
    pub fn reorder(&mut self, project_id: &str, updates: &[TaskUpdate]) -> Result<Vec<Task>, ApiError> {
        self.require_project(project_id)?;
        for update in updates {
            match self.tasks.iter().find(|t| t.id == update.id) {
                None => return Err(ApiError::Rejected(format!("unknown task {}", update.id))),
                Some(t) if t.project_id != project_id => {
                    return Err(ApiError::Rejected(format!(
                        "task {} belongs to project {}",
                        t.id, t.project_id
                    )));
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();
        for update in updates {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == update.id) {
                task.apply(update);
                task.updated_at = Some(now);
            }
        }
        self.normalize_project(project_id);
        Ok(self.list_tasks(&TaskFilter::project(project_id)))
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn list_projects(&self) -> Vec<Project> {
        self.projects
            .iter()
            .map(|p| {
                let mut p = p.clone();
                p.count = Some(crate::model::ProjectCount {
                    tasks: self.tasks.iter().filter(|t| t.project_id == p.id).count(),
                });
                p
            })
            .collect()
    }

    pub fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        self.list_projects()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))
    }

    pub fn create_project(&mut self, new: &NewProject) -> Result<Project, ApiError> {
        if new.name.trim().is_empty() {
            return Err(ApiError::Rejected("project name must not be empty".into()));
        }
        self.next_project += 1;
        let now = Utc::now();
        let owner = self.current_user();
        let project = Project {
            id: format!("P-{:03}", self.next_project),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            color: new.color.clone(),
            owner_id: Some(owner.id.clone()),
            owner: Some(owner),
            created_at: Some(now),
            updated_at: Some(now),
            count: None,
        };
        self.projects.push(project);
        self.get_project(&format!("P-{:03}", self.next_project))
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))?;
        patch.apply_to(project);
        project.updated_at = Some(Utc::now());
        self.get_project(id)
    }

    /// Delete a project together with its tasks
    pub fn delete_project(&mut self, id: &str) -> Result<(), ApiError> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Err(ApiError::NotFound(format!("project {}", id)));
        }
        self.tasks.retain(|t| t.project_id != id);
        Ok(())
    }

    pub fn current_user(&self) -> User {
        self.user.clone().unwrap_or_else(|| User {
            id: "local".into(),
            name: std::env::var("USER").unwrap_or_else(|_| "local".into()),
            email: String::new(),
            role: Role::Admin,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_project(&self, id: &str) -> Result<(), ApiError> {
        if self.projects.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("project {}", id)))
        }
    }

    fn column_len(&self, project_id: &str, status: TaskStatus) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.project_id == project_id && t.status == status)
            .count()
    }

    fn normalize_project(&mut self, project_id: &str) {
        let snapshot: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        let updates = normalize(&board_columns(&snapshot));
        for update in &updates {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == update.id) {
                task.apply(update);
            }
        }
    }
}

/// Task service held in memory. Useful for tests and demos; reorder calls
/// are counted and can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryApi {
    data: Mutex<BoardData>,
    reorder_calls: AtomicUsize,
    fail_reorder: Mutex<Option<String>>,
}

impl MemoryApi {
    pub fn new(data: BoardData) -> Self {
        MemoryApi {
            data: Mutex::new(data),
            ..MemoryApi::default()
        }
    }

    /// Number of `reorder_tasks` calls received so far (including failed ones)
    pub fn reorder_calls(&self) -> usize {
        self.reorder_calls.load(Ordering::SeqCst)
    }

    /// Make the next `reorder_tasks` call fail with `message`
    pub fn fail_next_reorder(&self, message: impl Into<String>) {
        *self.fail_reorder.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    fn data(&self) -> std::sync::MutexGuard<'_, BoardData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TaskApi for MemoryApi {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        Ok(self.data().list_tasks(filter))
    }

    async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.data().get_task(id)
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, ApiError> {
        self.data().create_task(new)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.data().update_task(id, patch)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.data().delete_task(id)
    }

    async fn reorder_tasks(&self, project_id: &str, updates: &[TaskUpdate]) -> Result<Vec<Task>, ApiError> {
        self.reorder_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.fail_reorder.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(message) = failure {
            return Err(ApiError::Http {
                status: 500,
                message,
            });
        }
        self.data().reorder(project_id, updates)
    }
}

#[async_trait]
impl ProjectApi for MemoryApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.data().list_projects())
    }

    async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        self.data().get_project(id)
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project, ApiError> {
        self.data().create_project(new)
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        self.data().update_project(id, patch)
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.data().delete_project(id)
    }
}

#[async_trait]
impl SessionApi for MemoryApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        Ok(self.data().current_user())
    }
}
