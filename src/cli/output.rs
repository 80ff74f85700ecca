use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::column::Column;
use crate::model::{Project, Task, TaskPriority, TaskStatus, User};
use crate::ops::check::{CheckError, CheckResult};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BoardJson<'a> {
    pub project: &'a Project,
    pub columns: Vec<ColumnJson<'a>>,
}

#[derive(Serialize)]
pub struct ColumnJson<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
pub struct MoveJson<'a> {
    pub task: Option<&'a Task>,
    pub moved: bool,
}

pub fn board_to_json<'a>(project: &'a Project, columns: &[Column<'a>]) -> BoardJson<'a> {
    BoardJson {
        project,
        columns: columns
            .iter()
            .map(|c| ColumnJson {
                status: c.status,
                tasks: c.tasks.clone(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_mark(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "!",
        TaskPriority::Medium => " ",
        TaskPriority::Low => ".",
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let assignee = task
        .assignee
        .as_ref()
        .map(|u| format!(" @{}", u.name))
        .or_else(|| task.assignee_id.as_ref().map(|id| format!(" @{}", id)))
        .unwrap_or_default();
    let due = task
        .due_date
        .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "{}{} {}{}{}",
        priority_mark(task.priority),
        task.id,
        task.title,
        assignee,
        due
    )
}

/// Format detailed task view
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", task.id, task.title),
        format!("status: {} (position {})", task.status.label(), task.position),
        format!("priority: {}", task.priority.as_str().to_lowercase()),
        format!("project: {}", task.project_id),
    ];
    if let Some(due) = task.due_date {
        lines.push(format!("due: {}", due.format("%Y-%m-%d")));
    }
    match (&task.assignee, &task.assignee_id) {
        (Some(user), _) => lines.push(format!("assignee: {} ({})", user.name, user.id)),
        (None, Some(id)) => lines.push(format!("assignee: {}", id)),
        (None, None) => {}
    }
    if let Some(created) = task.created_at {
        lines.push(format!("created: {}", created.format("%Y-%m-%d %H:%M")));
    }
    if let Some(updated) = task.updated_at {
        lines.push(format!("updated: {}", updated.format("%Y-%m-%d %H:%M")));
    }
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push("description:".to_string());
        for line in description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// Format the board as one block per column
pub fn format_board(project: &Project, columns: &[Column<'_>]) -> Vec<String> {
    let mut lines = vec![format!("== {} ({}) ==", project.name, project.id)];
    for column in columns {
        lines.push(String::new());
        lines.push(format!("{} ({})", column.status.label(), column.len()));
        for task in &column.tasks {
            lines.push(format!("  {}", format_task_line(task)));
        }
    }
    lines
}

pub fn format_project_line(project: &Project, current: bool) -> String {
    let marker = if current { "*" } else { " " };
    let count = project
        .count
        .map(|c| format!("  ({} tasks)", c.tasks))
        .unwrap_or_default();
    format!("{} {}  {}{}", marker, project.id, project.name, count)
}

pub fn format_user(user: &User) -> String {
    if user.email.is_empty() {
        format!("{} ({}) [{:?}]", user.name, user.id, user.role)
    } else {
        format!("{} <{}> ({}) [{:?}]", user.name, user.email, user.id, user.role)
    }
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    for err in &result.errors {
        lines.push(match err {
            CheckError::DuplicatePosition {
                project_id,
                status,
                position,
                task_ids,
            } => format!(
                "  [{} {}] position {} is shared by {}",
                project_id,
                status,
                position,
                task_ids.join(", ")
            ),
            CheckError::PositionGap {
                project_id,
                status,
                task_id,
                position,
                column_len,
            } => format!(
                "  [{} {}] {} has position {} in a column of {}",
                project_id, status, task_id, position, column_len
            ),
            CheckError::DuplicateId { task_id, count } => {
                format!("  {} appears {} times", task_id, count)
            }
        });
    }
    lines
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

pub fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(s)
        .ok_or_else(|| format!("unknown status '{}' (expected: todo, in-progress, done)", s))
}

pub fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(s)
        .ok_or_else(|| format!("unknown priority '{}' (expected: low, medium, high)", s))
}

/// Accept a plain date (midnight UTC) or a full RFC 3339 timestamp
pub fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| format!("invalid due date '{}' (expected YYYY-MM-DD)", s))
}
