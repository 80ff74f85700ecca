use std::sync::Arc;

use crate::model::column::Column;
use crate::model::{NewTask, Task, TaskFilter, TaskPatch, TaskUpdate};
use crate::ops::gesture::GestureError;
use crate::ops::partition::board_columns;
use crate::ops::reconcile::{normalize, reconcile_removal};

use super::api::{ApiError, Remote};

/// Error type for task store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Gesture(#[from] GestureError),
}

/// The task list as it was before an optimistic update
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tasks: Vec<Task>,
}

impl Snapshot {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

/// Local copy of the tasks in the current view.
///
/// The store is the only owner of the task list. Everything else reads it
/// through `tasks()` / `columns()` and changes it through update batches.
pub struct TaskStore {
    api: Arc<dyn Remote>,
    tasks: Vec<Task>,
    filter: TaskFilter,
    selected: Option<String>,
    error: Option<String>,
}

impl TaskStore {
    pub fn new(api: Arc<dyn Remote>) -> Self {
        TaskStore {
            api,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            selected: None,
            error: None,
        }
    }

    /// Store pre-filled with tasks, without a fetch
    pub fn with_tasks(api: Arc<dyn Remote>, tasks: Vec<Task>) -> Self {
        TaskStore {
            tasks,
            ..TaskStore::new(api)
        }
    }

    pub fn api(&self) -> &Arc<dyn Remote> {
        &self.api
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The board as it should render right now
    pub fn columns(&self) -> Vec<Column<'_>> {
        board_columns(&self.tasks)
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    /// Message from the last failed operation, cleared by the next success
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected(&self) -> Option<&Task> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    // -----------------------------------------------------------------------
    // Remote operations
    // -----------------------------------------------------------------------

    /// Load tasks from the remote. A given filter is merged over the current
    /// one, so fetching with `{status}` keeps an earlier `{projectId}`.
    pub async fn fetch(&mut self, filter: Option<&TaskFilter>) -> Result<(), StoreError> {
        if let Some(filter) = filter {
            self.filter = self.filter.merged(filter);
        }
        let result = self.api.list_tasks(&self.filter).await;
        let tasks = self.record(result)?;
        tracing::debug!(count = tasks.len(), "fetched tasks");
        self.tasks = tasks;
        if self.selected.as_deref().is_some_and(|id| self.get(id).is_none()) {
            self.selected = None;
        }
        Ok(())
    }

    /// Fetch one task, refresh it locally, and select it
    pub async fn fetch_one(&mut self, id: &str) -> Result<Task, StoreError> {
        let result = self.api.get_task(id).await;
        let task = self.record(result)?;
        self.upsert(task.clone());
        self.selected = Some(task.id.clone());
        Ok(task)
    }

    /// Create a task. The remote decides the final position (end of the
    /// column unless one was requested), so the view is refetched afterwards.
    pub async fn create(&mut self, new: &NewTask) -> Result<Task, StoreError> {
        let result = self.api.create_task(new).await;
        let task = self.record(result)?;
        tracing::info!(id = %task.id, status = %task.status, position = task.position, "created task");
        if self.filter.matches(&task) {
            let result = self.api.list_tasks(&self.filter).await;
            self.tasks = self.record(result)?;
        }
        Ok(task)
    }

    pub async fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        let result = self.api.update_task(id, patch).await;
        let task = self.record(result)?;
        self.upsert(task.clone());
        Ok(task)
    }

    /// Delete a task and close the gap it leaves in its column
    pub async fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let task = match self.get(id).cloned() {
            Some(task) => task,
            None => {
                let result = self.api.get_task(id).await;
                self.record(result)?
            }
        };
        let siblings: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == task.project_id)
            .cloned()
            .collect();
        let closing = if siblings.iter().any(|t| t.id == id) {
            reconcile_removal(&board_columns(&siblings), id)?
        } else {
            Vec::new()
        };

        let result = self.api.delete_task(id).await;
        self.record(result)?;
        self.tasks.retain(|t| t.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        tracing::info!(id, "deleted task");

        if !closing.is_empty() {
            self.reorder(&task.project_id, &closing).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Optimistic updates
    // -----------------------------------------------------------------------

    /// Apply a batch locally and return what the list looked like before
    pub fn apply_optimistic(&mut self, updates: &[TaskUpdate]) -> Snapshot {
        let snapshot = Snapshot {
            tasks: self.tasks.clone(),
        };
        for update in updates {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == update.id) {
                task.apply(update);
            }
        }
        snapshot
    }

    /// Merge the server's answer into the list. Returned tasks replace the
    /// local copy with the same id; tasks the server did not mention keep
    /// their optimistic state.
    pub fn commit(&mut self, server_tasks: Vec<Task>) {
        for task in server_tasks {
            if self.filter.matches(&task) || self.get(&task.id).is_some() {
                self.upsert(task);
            }
        }
        self.error = None;
    }

    /// Put back the exact list captured before the optimistic update and
    /// keep the reason as the store error
    pub fn rollback(&mut self, snapshot: Snapshot, cause: &ApiError) {
        self.tasks = snapshot.tasks;
        self.error = Some(cause.to_string());
    }

    /// Apply a batch optimistically, send it, then commit or roll back
    pub async fn reorder(&mut self, project_id: &str, updates: &[TaskUpdate]) -> Result<(), StoreError> {
        let snapshot = self.apply_optimistic(updates);
        let api = Arc::clone(&self.api);
        match api.reorder_tasks(project_id, updates).await {
            Ok(tasks) => {
                self.commit(tasks);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(project = project_id, error = %e, "reorder failed, rolling back");
                self.rollback(snapshot, &e);
                Err(e.into())
            }
        }
    }

    /// Renumber every column of `project_id` that has gaps or duplicates.
    /// Returns the batch that was sent (empty when nothing needed fixing).
    pub async fn repair(&mut self, project_id: &str) -> Result<Vec<TaskUpdate>, StoreError> {
        let tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        let updates = normalize(&board_columns(&tasks));
        if !updates.is_empty() {
            self.reorder(project_id, &updates).await?;
        }
        Ok(updates)
    }

    /// Keep the error message around for the UI, then hand the result back
    fn record<T>(&mut self, result: Result<T, ApiError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }
}
