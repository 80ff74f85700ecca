use crate::model::column::Column;
use crate::model::task::{Task, TaskStatus};

/// Split a flat task list into one column per status, in the order the
/// statuses are given. Each column is sorted by position; equal positions
/// (a broken invariant, but possible with stale data) fall back to task id
/// so the result is deterministic.
pub fn partition<'a>(tasks: &'a [Task], statuses: &[TaskStatus]) -> Vec<Column<'a>> {
    statuses
        .iter()
        .map(|&status| {
            let mut column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
            column.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
            Column {
                status,
                tasks: column,
            }
        })
        .collect()
}

/// Partition with the standard board statuses (TODO, IN_PROGRESS, DONE)
pub fn board_columns(tasks: &[Task]) -> Vec<Column<'_>> {
    partition(tasks, &TaskStatus::ALL)
}
