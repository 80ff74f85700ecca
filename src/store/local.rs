//! File-backed task service: the whole board lives in `board.json` inside
//! the board directory. Every call takes the directory lock, loads the file,
//! and (for writes) persists it atomically before releasing the lock.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::io::lock::FileLock;
use crate::model::{NewProject, NewTask, Project, ProjectPatch, Task, TaskFilter, TaskPatch, TaskUpdate, User};

use super::api::{ApiError, ProjectApi, SessionApi, TaskApi};
use super::memory::BoardData;

pub const BOARD_FILE: &str = "board.json";

#[derive(Debug, Clone)]
pub struct LocalApi {
    dir: PathBuf,
}

impl LocalApi {
    /// Serve the board stored in `dir` (usually `.taskboard/`)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalApi { dir: dir.into() }
    }

    pub fn board_file(&self) -> PathBuf {
        self.dir.join(BOARD_FILE)
    }

    /// Run `f` against the stored board under the directory lock. Changes are
    /// written back only when `write` is set and `f` succeeds.
    fn with_data<T>(
        &self,
        write: bool,
        f: impl FnOnce(&mut BoardData) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let lock = FileLock::acquire_default(&self.dir)?;
        tracing::trace!(lock = %lock.path().display(), "board lock held");
        let mut data = load_board(&self.board_file())?;
        let out = f(&mut data)?;
        if write {
            save_board(&self.dir, &data)?;
        }
        Ok(out)
    }
}

/// Read `board.json`; a missing file is an empty board
pub fn load_board(path: &Path) -> Result<BoardData, ApiError> {
    if !path.exists() {
        return Ok(BoardData::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write `board.json` through a temp file in the same directory so readers
/// never see a half-written board.
pub fn save_board(dir: &Path, data: &BoardData) -> Result<(), ApiError> {
    let json = serde_json::to_string_pretty(data)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(dir.join(BOARD_FILE)).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl TaskApi for LocalApi {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.with_data(false, |d| Ok(d.list_tasks(filter)))
    }

    async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.with_data(false, |d| d.get_task(id))
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, ApiError> {
        self.with_data(true, |d| d.create_task(new))
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.with_data(true, |d| d.update_task(id, patch))
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.with_data(true, |d| d.delete_task(id))
    }

    async fn reorder_tasks(&self, project_id: &str, updates: &[TaskUpdate]) -> Result<Vec<Task>, ApiError> {
        self.with_data(true, |d| d.reorder(project_id, updates))
    }
}

#[async_trait]
impl ProjectApi for LocalApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.with_data(false, |d| Ok(d.list_projects()))
    }

    async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        self.with_data(false, |d| d.get_project(id))
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project, ApiError> {
        self.with_data(true, |d| d.create_project(new))
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        self.with_data(true, |d| d.update_project(id, patch))
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.with_data(true, |d| d.delete_project(id))
    }
}

#[async_trait]
impl SessionApi for LocalApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        self.with_data(false, |d| Ok(d.current_user()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalApi) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".taskboard");
        fs::create_dir_all(&dir).unwrap();
        (tmp, LocalApi::new(dir))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_board() {
        let (_tmp, api) = setup();
        assert!(api.list_projects().await.unwrap().is_empty());
        assert!(!api.board_file().exists());
    }

    #[tokio::test]
    async fn test_writes_persist_across_instances() {
        let (_tmp, api) = setup();
        let project = api
            .create_project(&NewProject {
                name: "Demo".into(),
                ..NewProject::default()
            })
            .await
            .unwrap();
        let task = api
            .create_task(&NewTask {
                title: "First".into(),
                project_id: project.id.clone(),
                ..NewTask::default()
            })
            .await
            .unwrap();

        let reopened = LocalApi::new(api.dir.clone());
        let tasks = reopened.list_tasks(&TaskFilter::project(&project.id)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
        assert_eq!(tasks[0].status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_file_untouched() {
        let (_tmp, api) = setup();
        api.create_project(&NewProject {
            name: "Demo".into(),
            ..NewProject::default()
        })
        .await
        .unwrap();
        let before = fs::read_to_string(api.board_file()).unwrap();
        let err = api
            .reorder_tasks("P-001", &[TaskUpdate::position("T-404", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
        assert_eq!(fs::read_to_string(api.board_file()).unwrap(), before);
    }
}
