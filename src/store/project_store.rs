use std::sync::Arc;

use crate::model::{NewProject, Project, ProjectPatch};

use super::api::{ApiError, Remote};

/// Local copy of the projects the current user can see
pub struct ProjectStore {
    api: Arc<dyn Remote>,
    projects: Vec<Project>,
}

impl ProjectStore {
    pub fn new(api: Arc<dyn Remote>) -> Self {
        ProjectStore {
            api,
            projects: Vec::new(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.projects = self.api.list_projects().await?;
        Ok(())
    }

    /// Find a project by id, or by name ignoring case
    pub fn find(&self, key: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == key)
            .or_else(|| self.projects.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
    }

    pub async fn create(&mut self, new: &NewProject) -> Result<Project, ApiError> {
        let project = self.api.create_project(new).await?;
        tracing::info!(id = %project.id, name = %project.name, "created project");
        self.projects.push(project.clone());
        Ok(project)
    }

    pub async fn update(&mut self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        let project = self.api.update_project(id, patch).await?;
        self.upsert(project.clone());
        Ok(project)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        self.api.delete_project(id).await?;
        self.projects.retain(|p| p.id != id);
        tracing::info!(id, "deleted project");
        Ok(())
    }

    fn upsert(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{BoardData, MemoryApi};

    fn store() -> ProjectStore {
        ProjectStore::new(Arc::new(MemoryApi::new(BoardData::default())))
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let mut store = store();
        let p = store
            .create(&NewProject {
                name: "Website".into(),
                ..NewProject::default()
            })
            .await
            .unwrap();
        assert_eq!(store.find("website").map(|p| p.id.as_str()), Some(p.id.as_str()));

        store
            .update(
                &p.id,
                &ProjectPatch {
                    name: Some("Site".into()),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.find(&p.id).map(|p| p.name.as_str()), Some("Site"));

        store.delete(&p.id).await.unwrap();
        assert!(store.find("site").is_none());
        store.fetch().await.unwrap();
        assert!(store.projects().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_project() {
        let mut store = store();
        let err = store.update("P-404", &ProjectPatch::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
