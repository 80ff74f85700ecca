use crate::model::column::{Column, column_for, locate};
use crate::model::task::TaskStatus;

/// Error type for drag gestures that reference something the board no
/// longer has
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("invalid drop target: {0}")]
    InvalidTarget(String),
}

/// Where a dragged task was released
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// The empty area of a column: append to its end
    Column(TaskStatus),
    /// Another task: take that task's slot
    Task(String),
}

impl DropTarget {
    /// Resolve a raw drop id the way a UI reports it: a status name means the
    /// column, anything else must be a task on the board.
    pub fn resolve(raw: &str, columns: &[Column<'_>]) -> Result<DropTarget, GestureError> {
        if let Some(status) = TaskStatus::parse(raw) {
            if column_for(columns, status).is_some() {
                return Ok(DropTarget::Column(status));
            }
            return Err(GestureError::InvalidTarget(raw.to_string()));
        }
        if locate(columns, raw).is_some() {
            Ok(DropTarget::Task(raw.to_string()))
        } else {
            Err(GestureError::InvalidTarget(raw.to_string()))
        }
    }
}

/// The slot a drop resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub status: TaskStatus,
    /// Index in the destination column, counted without the dragged task
    pub index: usize,
}

/// Turn a finished drag into a target slot. `Ok(None)` means the drop lands
/// exactly where the task already is and nothing should happen.
pub fn interpret(
    columns: &[Column<'_>],
    active_id: &str,
    target: &DropTarget,
) -> Result<Option<Placement>, GestureError> {
    let (_, active_index, active) =
        locate(columns, active_id).ok_or_else(|| GestureError::TaskNotFound(active_id.to_string()))?;

    let placement = match target {
        DropTarget::Column(status) => {
            let column = column_for(columns, *status)
                .ok_or_else(|| GestureError::InvalidTarget(status.as_str().to_string()))?;
            if active.status == *status {
                // Already in this column; the empty area is only an append
                // target for tasks coming from elsewhere.
                return Ok(None);
            }
            Placement {
                status: *status,
                index: column.len(),
            }
        }
        DropTarget::Task(over_id) => {
            let (_, over_index, over) = locate(columns, over_id)
                .ok_or_else(|| GestureError::TaskNotFound(over_id.clone()))?;
            Placement {
                status: over.status,
                index: over_index,
            }
        }
    };

    if placement.status == active.status && placement.index == active_index {
        return Ok(None);
    }
    Ok(Some(placement))
}
