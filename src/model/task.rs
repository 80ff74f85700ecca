use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Board column a task lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Every status, in board order (left to right)
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire name, e.g. `IN_PROGRESS`
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Column heading
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Parse a status name. Accepts the wire name in any case, with `-` or
    /// `_` separators, plus the short form `doing`.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" | "to_do" => Some(TaskStatus::Todo),
            "in_progress" | "inprogress" | "doing" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<TaskPriority> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(TaskPriority::Low),
            "medium" | "med" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// A user as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A task on the board.
///
/// Only `status` and `position` matter to the board engine; everything else is
/// carried through untouched, including fields this client does not know
/// about (kept in `extra` so they survive a round trip).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Zero-based rank inside the task's (project, status) column
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Create a task with only the fields the board cares about
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
        status: TaskStatus,
        position: usize,
    ) -> Self {
        Task {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status,
            priority: TaskPriority::default(),
            position,
            due_date: None,
            assignee_id: None,
            assignee: None,
            created_at: None,
            updated_at: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Apply one reorder entry to this task
    pub fn apply(&mut self, update: &TaskUpdate) {
        self.position = update.position;
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// One entry of a reorder batch: the task's new position, and its new status
/// if the task changed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: String,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn position(id: impl Into<String>, position: usize) -> Self {
        TaskUpdate {
            id: id.into(),
            position,
            status: None,
        }
    }

    pub fn moved(id: impl Into<String>, position: usize, status: TaskStatus) -> Self {
        TaskUpdate {
            id: id.into(),
            position,
            status: Some(status),
        }
    }
}

/// Payload for creating a task. `status` defaults to TODO and `position` to the
/// end of that column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

/// Direct edit of a task's descriptive fields. Status and position are not
/// editable here; they only change through a reorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }

    /// Apply the set fields to a local task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        if let Some(assignee) = &self.assignee_id {
            task.assignee_id = Some(assignee.clone());
        }
    }
}

/// Query parameters for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

impl TaskFilter {
    pub fn project(project_id: impl Into<String>) -> Self {
        TaskFilter {
            project_id: Some(project_id.into()),
            ..TaskFilter::default()
        }
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merged(&self, other: &TaskFilter) -> TaskFilter {
        TaskFilter {
            project_id: other.project_id.clone().or_else(|| self.project_id.clone()),
            status: other.status.or(self.status),
            priority: other.priority.or(self.priority),
            assignee_id: other.assignee_id.clone().or_else(|| self.assignee_id.clone()),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.as_ref().is_none_or(|p| *p == task.project_id)
            && self.status.is_none_or(|s| s == task.status)
            && self.priority.is_none_or(|p| p == task.priority)
            && self
                .assignee_id
                .as_ref()
                .is_none_or(|a| task.assignee_id.as_ref() == Some(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(back, TaskStatus::Done);
    }

    #[test]
    fn status_parse_is_lenient() {
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("IN_PROGRESS"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("todo"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("T-001"), None);
    }

    #[test]
    fn task_keeps_unknown_fields() {
        let raw = r#"{
            "id": "t1",
            "projectId": "p1",
            "title": "Write docs",
            "status": "TODO",
            "priority": "HIGH",
            "position": 0,
            "createdById": "u1",
            "project": {"id": "p1", "name": "Docs"}
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.extra["createdById"], "u1");

        let out = serde_json::to_value(&task).unwrap();
        assert_eq!(out["project"]["name"], "Docs");
        assert_eq!(out["projectId"], "p1");
    }

    #[test]
    fn update_omits_unchanged_status() {
        let json = serde_json::to_string(&TaskUpdate::position("a", 2)).unwrap();
        assert_eq!(json, r#"{"id":"a","position":2}"#);
        let json = serde_json::to_string(&TaskUpdate::moved("a", 0, TaskStatus::Done)).unwrap();
        assert_eq!(json, r#"{"id":"a","position":0,"status":"DONE"}"#);
    }

    #[test]
    fn filter_merge_prefers_newer_fields() {
        let base = TaskFilter {
            project_id: Some("p1".into()),
            status: Some(TaskStatus::Todo),
            ..TaskFilter::default()
        };
        let merged = base.merged(&TaskFilter {
            status: Some(TaskStatus::Done),
            ..TaskFilter::default()
        });
        assert_eq!(merged.project_id.as_deref(), Some("p1"));
        assert_eq!(merged.status, Some(TaskStatus::Done));
    }

    #[test]
    fn filter_matches() {
        let task = Task::new("t1", "p1", "A", TaskStatus::Todo, 0);
        assert!(TaskFilter::project("p1").matches(&task));
        assert!(!TaskFilter::project("p2").matches(&task));
        let by_assignee = TaskFilter {
            assignee_id: Some("u1".into()),
            ..TaskFilter::default()
        };
        assert!(!by_assignee.matches(&task));
    }
}
