//! REST client for the task API.
//!
//! Responses normally come wrapped as `{success, data, message}`; a bare
//! JSON body is accepted as the payload itself.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{
    NewProject, NewTask, Project, ProjectPatch, RemoteConfig, Task, TaskFilter, TaskPatch,
    TaskUpdate, User,
};

use super::api::{ApiError, ProjectApi, SessionApi, TaskApi};

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Serialize)]
struct ReorderBody<'a> {
    tasks: &'a [TaskUpdate],
}

impl HttpApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpApi {
            client,
            base_url: parsed,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(remote: &RemoteConfig) -> Result<Self, ApiError> {
        Self::new(
            &remote.base_url,
            remote.token.clone(),
            Duration::from_secs(remote.timeout_secs),
        )
    }

    /// The base url with `segments` appended, each encoded as a single path
    /// segment so ids cannot add path levels or a query
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // only fails for cannot-be-a-base urls, which `new` rejects
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.url(segments));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope. `Ok(None)` means the
    /// server answered successfully without a payload.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text, status);
            tracing::debug!(status = status.as_u16(), %message, "api error");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Http {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: Value = serde_json::from_str(&text)?;
        let payload = match body {
            Value::Object(mut map) if map.contains_key("data") || map.contains_key("success") => {
                if map.get("success") == Some(&Value::Bool(false)) {
                    let message = map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("request failed")
                        .to_string();
                    return Err(ApiError::Rejected(message));
                }
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        if payload.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(payload)?))
    }

    async fn send_required<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        self.send(builder)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse(what.to_string()))
    }
}

/// Pull a readable message out of an error body
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match json.get("message") {
            Some(Value::String(msg)) => return msg.clone(),
            // validation errors come back as a list of messages
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if !parts.is_empty() {
                    return parts.join("; ");
                }
            }
            _ => {}
        }
    }
    if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl TaskApi for HttpApi {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        let tasks = self.send(self.request(Method::GET, &["tasks"]).query(filter)).await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.send_required(self.request(Method::GET, &["tasks", id]), "task")
            .await
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task, ApiError> {
        self.send_required(self.request(Method::POST, &["tasks"]).json(new), "new task")
            .await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.send_required(
            self.request(Method::PATCH, &["tasks", id]).json(patch),
            "updated task",
        )
        .await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.send::<Value>(self.request(Method::DELETE, &["tasks", id]))
            .await?;
        Ok(())
    }

    async fn reorder_tasks(&self, project_id: &str, updates: &[TaskUpdate]) -> Result<Vec<Task>, ApiError> {
        tracing::debug!(project = project_id, count = updates.len(), "PATCH reorder");
        let builder = self
            .request(Method::PATCH, &["tasks", "projects", project_id, "reorder"])
            .json(&ReorderBody { tasks: updates });
        let tasks = self.send(builder).await?;
        Ok(tasks.unwrap_or_default())
    }
}

#[async_trait]
impl ProjectApi for HttpApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let projects = self.send(self.request(Method::GET, &["projects"])).await?;
        Ok(projects.unwrap_or_default())
    }

    async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        self.send_required(self.request(Method::GET, &["projects", id]), "project")
            .await
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project, ApiError> {
        self.send_required(self.request(Method::POST, &["projects"]).json(new), "new project")
            .await
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        self.send_required(
            self.request(Method::PATCH, &["projects", id]).json(patch),
            "updated project",
        )
        .await
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.send::<Value>(self.request(Method::DELETE, &["projects", id]))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionApi for HttpApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        self.send_required(self.request(Method::GET, &["users", "me"]), "current user")
            .await
    }
}
