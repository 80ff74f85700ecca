use crate::model::column::{Column, column_for, locate};
use crate::model::task::{Task, TaskUpdate};

use super::gesture::{GestureError, Placement};

/// Compute the reorder batch for moving `active_id` to `placement`.
///
/// The dragged task is taken out of its column first, then inserted into the
/// destination at `placement.index` (clamped to the column's length), so the
/// index always refers to the destination as it looks without the dragged
/// task. Both affected columns are renumbered `0..n`. Only tasks whose
/// position or status actually change are returned; the moved task carries
/// its new status when it changes columns.
pub fn reconcile(
    columns: &[Column<'_>],
    active_id: &str,
    placement: Placement,
) -> Result<Vec<TaskUpdate>, GestureError> {
    let (_, _, active) =
        locate(columns, active_id).ok_or_else(|| GestureError::TaskNotFound(active_id.to_string()))?;
    let source = column_for(columns, active.status)
        .ok_or_else(|| GestureError::InvalidTarget(active.status.as_str().to_string()))?;
    let dest = column_for(columns, placement.status)
        .ok_or_else(|| GestureError::InvalidTarget(placement.status.as_str().to_string()))?;

    let mut updates = Vec::new();

    if active.status == placement.status {
        let order = reinsert(without(&source.tasks, active_id), active, placement.index);
        renumber(&order, &mut updates);
        return Ok(updates);
    }

    let remaining = without(&source.tasks, active_id);
    renumber(&remaining, &mut updates);

    let order = reinsert(dest.tasks.clone(), active, placement.index);
    for (position, task) in order.iter().enumerate() {
        if task.id == active_id {
            updates.push(TaskUpdate::moved(&task.id, position, placement.status));
        } else if task.position != position {
            updates.push(TaskUpdate::position(&task.id, position));
        }
    }
    Ok(updates)
}

/// Batch that closes the gap left by removing `removed_id` from its column
pub fn reconcile_removal(
    columns: &[Column<'_>],
    removed_id: &str,
) -> Result<Vec<TaskUpdate>, GestureError> {
    let (ci, _, _) = locate(columns, removed_id)
        .ok_or_else(|| GestureError::TaskNotFound(removed_id.to_string()))?;
    let mut updates = Vec::new();
    renumber(&without(&columns[ci].tasks, removed_id), &mut updates);
    Ok(updates)
}

/// Batch that renumbers every column to `0..n` in its current render order.
/// Empty when all columns are already contiguous.
pub fn normalize(columns: &[Column<'_>]) -> Vec<TaskUpdate> {
    let mut updates = Vec::new();
    for column in columns {
        renumber(&column.tasks, &mut updates);
    }
    updates
}

fn without<'a>(tasks: &[&'a Task], id: &str) -> Vec<&'a Task> {
    tasks.iter().copied().filter(|t| t.id != id).collect()
}

fn reinsert<'a>(mut tasks: Vec<&'a Task>, task: &'a Task, index: usize) -> Vec<&'a Task> {
    let index = index.min(tasks.len());
    tasks.insert(index, task);
    tasks
}

fn renumber(order: &[&Task], updates: &mut Vec<TaskUpdate>) {
    for (position, task) in order.iter().enumerate() {
        if task.position != position {
            updates.push(TaskUpdate::position(&task.id, position));
        }
    }
}
