use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::task::{Task, TaskStatus};

/// Structured result from `tb check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub tasks_checked: usize,
    pub errors: Vec<CheckError>,
}

/// A broken ordering invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Two or more tasks in the same column share a position
    #[serde(rename = "duplicate_position")]
    DuplicatePosition {
        project_id: String,
        status: TaskStatus,
        position: usize,
        task_ids: Vec<String>,
    },
    /// A task sits past the end of its column, so some slot below it is empty
    #[serde(rename = "position_gap")]
    PositionGap {
        project_id: String,
        status: TaskStatus,
        task_id: String,
        position: usize,
        column_len: usize,
    },
    /// The same task id appears more than once
    #[serde(rename = "duplicate_id")]
    DuplicateId { task_id: String, count: usize },
}

/// Validate positions across every (project, status) column.
///
/// This is a read-only operation. A column is valid when its positions are
/// exactly `0..n`: no position repeats and none reaches `n`.
pub fn check_tasks(tasks: &[Task]) -> CheckResult {
    let errors = find_violations(tasks);
    CheckResult {
        valid: errors.is_empty(),
        tasks_checked: tasks.len(),
        errors,
    }
}

pub fn find_violations(tasks: &[Task]) -> Vec<CheckError> {
    let mut errors = Vec::new();

    let mut id_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        *id_counts.entry(task.id.as_str()).or_default() += 1;
    }
    for (id, count) in id_counts {
        if count > 1 {
            errors.push(CheckError::DuplicateId {
                task_id: id.to_string(),
                count,
            });
        }
    }

    let mut columns: BTreeMap<(&str, TaskStatus), Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        columns
            .entry((task.project_id.as_str(), task.status))
            .or_default()
            .push(task);
    }

    for ((project_id, status), column) in columns {
        let len = column.len();
        let mut by_position: HashMap<usize, Vec<&str>> = HashMap::new();
        for task in &column {
            by_position.entry(task.position).or_default().push(task.id.as_str());
            if task.position >= len {
                errors.push(CheckError::PositionGap {
                    project_id: project_id.to_string(),
                    status,
                    task_id: task.id.clone(),
                    position: task.position,
                    column_len: len,
                });
            }
        }
        let mut dupes: Vec<(usize, Vec<&str>)> = by_position
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect();
        dupes.sort_by_key(|(pos, _)| *pos);
        for (position, mut ids) in dupes {
            ids.sort_unstable();
            errors.push(CheckError::DuplicatePosition {
                project_id: project_id.to_string(),
                status,
                position,
                task_ids: ids.into_iter().map(String::from).collect(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(id: &str, project: &str, status: TaskStatus, position: usize) -> Task {
        Task::new(id, project, id, status, position)
    }

    #[test]
    fn test_contiguous_board_is_valid() {
        let tasks = vec![
            task("a", "p1", TaskStatus::Todo, 0),
            task("b", "p1", TaskStatus::Todo, 1),
            task("x", "p1", TaskStatus::Done, 0),
            // same status, other project: its own column
            task("q", "p2", TaskStatus::Todo, 0),
        ];
        let result = check_tasks(&tasks);
        assert!(result.valid);
        assert_eq!(result.tasks_checked, 4);
    }

    #[test]
    fn test_gap_detected() {
        let tasks = vec![
            task("a", "p1", TaskStatus::Todo, 0),
            task("b", "p1", TaskStatus::Todo, 2),
        ];
        assert_eq!(
            find_violations(&tasks),
            vec![CheckError::PositionGap {
                project_id: "p1".into(),
                status: TaskStatus::Todo,
                task_id: "b".into(),
                position: 2,
                column_len: 2,
            }]
        );
    }

    #[test]
    fn test_duplicate_position_detected() {
        let tasks = vec![
            task("b", "p1", TaskStatus::InProgress, 0),
            task("a", "p1", TaskStatus::InProgress, 0),
        ];
        let errors = find_violations(&tasks);
        // position 1 is missing too, but the duplicate is what gets reported
        assert_eq!(
            errors,
            vec![CheckError::DuplicatePosition {
                project_id: "p1".into(),
                status: TaskStatus::InProgress,
                position: 0,
                task_ids: vec!["a".into(), "b".into()],
            }]
        );
    }

    #[test]
    fn test_duplicate_id_detected() {
        let tasks = vec![
            task("a", "p1", TaskStatus::Todo, 0),
            task("a", "p1", TaskStatus::Done, 0),
        ];
        let result = check_tasks(&tasks);
        assert!(!result.valid);
        assert!(matches!(result.errors[0], CheckError::DuplicateId { count: 2, .. }));
    }
}
